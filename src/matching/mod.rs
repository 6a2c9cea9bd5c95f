//! Weighted skill matching between a posting's requirements and a candidate.

mod rank;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    db::{Posting, User},
    taxonomy::{extract_terms, phrase_contains, Taxonomy},
};

pub use rank::{rank_candidates, Recommendation};

const MUST_WEIGHT: u32 = 2;
const NICE_WEIGHT: u32 = 1;
const GENERAL_WEIGHT: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequirementTiers {
    pub must: BTreeSet<String>,
    pub nice: BTreeSet<String>,
    pub general: BTreeSet<String>,
}

impl RequirementTiers {
    /// Explicit tiers plus the posting's domain/tech terms as the general tier. A
    /// posting that lists nothing at all gets its general tier inferred from known
    /// skill names in its title and description.
    pub fn for_posting(posting: &Posting, taxonomy: &Taxonomy) -> Self {
        let mut tiers = Self {
            must: posting.must_have.clone(),
            nice: posting.nice_to_have.clone(),
            general: extract_terms(&posting.terms),
        };

        if tiers.is_empty() {
            let prose = format!("{} {}", posting.title, posting.description);
            tiers.general = taxonomy.scan_prose(&prose);
        }

        tiers
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.nice.is_empty() && self.general.is_empty()
    }

    pub fn max_possible(&self) -> u32 {
        MUST_WEIGHT * self.must.len() as u32
            + NICE_WEIGHT * self.nice.len() as u32
            + GENERAL_WEIGHT * self.general.len() as u32
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchScore {
    pub raw_score: u32,
    pub max_possible: u32,
    /// 0..=100, rounded half up.
    pub percent: u8,
    /// Requirement terms the candidate covers, across all tiers.
    pub matched: BTreeSet<String>,
}

/// Normalized terms from a user's skills and interests.
pub fn candidate_terms(user: &User) -> BTreeSet<String> {
    let mut terms = extract_terms(&user.skills);
    terms.extend(extract_terms(&user.interests));
    terms
}

/// Normalized terms from a user's skills alone; what hard filters look at.
pub fn skill_terms(user: &User) -> BTreeSet<String> {
    extract_terms(&user.skills)
}

/// Whether `requirement` (or one of its synonyms) appears among the already expanded
/// candidate terms, either exactly or as a whole-word run inside a longer phrase.
pub fn meets(taxonomy: &Taxonomy, requirement: &str, candidate_expanded: &BTreeSet<String>) -> bool {
    taxonomy.expand([requirement]).iter().any(|wanted| {
        candidate_expanded.contains(wanted)
            || candidate_expanded
                .iter()
                .any(|have| phrase_contains(have, wanted))
    })
}

/// Requirement terms from `required` that the candidate meets.
pub fn covered<'a>(
    taxonomy: &Taxonomy,
    required: &'a BTreeSet<String>,
    candidate_expanded: &BTreeSet<String>,
) -> impl Iterator<Item = &'a String> {
    required
        .iter()
        .filter(move |term| meets(taxonomy, term, candidate_expanded))
}

pub fn score(
    taxonomy: &Taxonomy,
    tiers: &RequirementTiers,
    candidate_terms: &BTreeSet<String>,
) -> MatchScore {
    let candidate_expanded = taxonomy.expand(candidate_terms);
    let mut matched = BTreeSet::new();
    let mut raw_score = 0;

    for (tier, weight) in [
        (&tiers.must, MUST_WEIGHT),
        (&tiers.nice, NICE_WEIGHT),
        (&tiers.general, GENERAL_WEIGHT),
    ] {
        for term in covered(taxonomy, tier, &candidate_expanded) {
            raw_score += weight;
            matched.insert(term.clone());
        }
    }

    let max_possible = tiers.max_possible();
    MatchScore {
        raw_score,
        max_possible,
        percent: percent(raw_score, max_possible),
        matched,
    }
}

/// Scores `user` against `posting` with the posting's effective tiers.
pub fn score_user(taxonomy: &Taxonomy, posting: &Posting, user: &User) -> MatchScore {
    let tiers = RequirementTiers::for_posting(posting, taxonomy);
    score(taxonomy, &tiers, &candidate_terms(user))
}

fn percent(raw_score: u32, max_possible: u32) -> u8 {
    if max_possible == 0 {
        return 0;
    }
    let (raw, max) = (u64::from(raw_score), u64::from(max_possible));
    ((200 * raw + max) / (2 * max)).min(100) as u8
}
