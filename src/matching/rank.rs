use std::cmp::Reverse;

use serde::Serialize;

use crate::{
    db::{Posting, User},
    taxonomy::Taxonomy,
};

use super::{candidate_terms, score, MatchScore, RequirementTiers};

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub user: User,
    pub score: MatchScore,
}

/// Best-first candidates for `posting`, dropping anyone who matches nothing.
///
/// Ties on raw score fall back to percentage, then name, then id, so the order is
/// stable across calls.
pub fn rank_candidates(
    taxonomy: &Taxonomy,
    posting: &Posting,
    candidates: impl IntoIterator<Item = User>,
    limit: usize,
) -> Vec<Recommendation> {
    let tiers = RequirementTiers::for_posting(posting, taxonomy);

    let mut ranked: Vec<Recommendation> = candidates
        .into_iter()
        .map(|user| {
            let score = score(taxonomy, &tiers, &candidate_terms(&user));
            Recommendation { user, score }
        })
        .filter(|rec| rec.score.raw_score > 0)
        .collect();

    ranked.sort_by_cached_key(|rec| {
        (
            Reverse(rec.score.raw_score),
            Reverse(rec.score.percent),
            rec.user.name.to_lowercase(),
            rec.user.id,
        )
    });
    ranked.truncate(limit);
    ranked
}
