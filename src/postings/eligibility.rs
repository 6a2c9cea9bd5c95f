use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    db::{Posting, RequestStatus, Role, User},
    matching::{covered, skill_terms},
    taxonomy::Taxonomy,
};

/// Why a viewer may not apply to a posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Ineligibility {
    AlreadyRequested { status: RequestStatus },
    AudienceMismatch,
    Owner,
    Closed,
    DeadlinePassed,
    CapacityReached { role: Role },
    MissingSkills { terms: Vec<String> },
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ineligibility::AlreadyRequested { status } => {
                write!(f, "Already applied (status: {status})")
            }
            Ineligibility::AudienceMismatch => f.write_str("Not open to your role"),
            Ineligibility::Owner => f.write_str("Owner"),
            Ineligibility::Closed => f.write_str("Posting is closed"),
            Ineligibility::DeadlinePassed => f.write_str("Application deadline has passed"),
            Ineligibility::CapacityReached { role } => write!(f, "Limit reached for {role}s"),
            Ineligibility::MissingSkills { terms } => {
                write!(f, "Missing required skills: {}", terms.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "eligibility", rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    Ineligible(Ineligibility),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }

    pub fn reason(&self) -> Option<&Ineligibility> {
        match self {
            Eligibility::Eligible => None,
            Eligibility::Ineligible(reason) => Some(reason),
        }
    }
}

/// Store facts the rules need beyond the posting and the viewer.
#[derive(Debug, Clone, Copy)]
pub struct ApplyContext {
    pub existing: Option<RequestStatus>,
    /// Accepted participants sharing the viewer's role.
    pub accepted: u32,
    pub now: OffsetDateTime,
}

/// Runs the application rules in order; the first one that fails decides.
pub fn can_apply(
    taxonomy: &Taxonomy,
    posting: &Posting,
    viewer: &User,
    ctx: ApplyContext,
) -> Eligibility {
    use Ineligibility::*;

    let verdict = if let Some(status) = ctx.existing {
        Some(AlreadyRequested { status })
    } else if !posting.audience.admits(posting.owner_role, viewer.role) {
        Some(AudienceMismatch)
    } else if posting.owner_id == viewer.id {
        Some(Owner)
    } else if !posting.is_open() {
        Some(Closed)
    } else if posting.deadline_passed(ctx.now) {
        Some(DeadlinePassed)
    } else if ctx.accepted >= posting.capacity.limit(viewer.role) {
        Some(CapacityReached { role: viewer.role })
    } else if !meets_must_have(taxonomy, posting, viewer) {
        Some(MissingSkills {
            terms: posting.must_have.iter().cloned().collect(),
        })
    } else {
        None
    };

    match verdict {
        Some(reason) => Eligibility::Ineligible(reason),
        None => Eligibility::Eligible,
    }
}

/// Empty must-have lists are always met; otherwise one covered term is enough.
pub(crate) fn meets_must_have(taxonomy: &Taxonomy, posting: &Posting, viewer: &User) -> bool {
    if posting.must_have.is_empty() {
        return true;
    }
    let expanded = taxonomy.expand(&skill_terms(viewer));
    covered(taxonomy, &posting.must_have, &expanded).next().is_some()
}
