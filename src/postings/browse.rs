use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::{
    db::{Posting, Role},
    matching::{rank_candidates, score_user, MatchScore, Recommendation},
    store::PostingFilter,
    AppResult, Engine,
};

use super::{can_apply, is_visible, ApplyContext, Eligibility};

/// A posting as one viewer sees it in the feed.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub posting: Posting,
    pub score: MatchScore,
}

impl Engine {
    /// Open postings the viewer may see, each with the viewer's match against it.
    pub async fn browse(&self, viewer_id: Uuid, filter: &PostingFilter) -> AppResult<Vec<Listing>> {
        let viewer = self.user(viewer_id).await?;

        let listings: Vec<Listing> = self
            .postings
            .list_open(filter)
            .await?
            .into_iter()
            .filter(|posting| is_visible(&self.taxonomy, posting, &viewer))
            .map(|posting| {
                let score = score_user(&self.taxonomy, &posting, &viewer);
                Listing { posting, score }
            })
            .collect();

        debug!(viewer = %viewer.id, shown = listings.len(), "browse");
        Ok(listings)
    }

    pub async fn can_apply(&self, posting_id: Uuid, viewer_id: Uuid) -> AppResult<Eligibility> {
        let posting = self.posting(posting_id).await?;
        let viewer = self.user(viewer_id).await?;

        let existing = self
            .requests
            .find(posting.id, viewer.id)
            .await?
            .map(|request| request.status);
        let accepted = self.postings.count_accepted(posting.id, viewer.role).await?;

        let ctx = ApplyContext { existing, accepted, now: OffsetDateTime::now_utc() };
        Ok(can_apply(&self.taxonomy, &posting, &viewer, ctx))
    }

    /// Owner-only: people worth inviting, best match first.
    ///
    /// Only roles the audience admits and the posting has slots for are considered,
    /// and anyone already holding a request on the posting is left out.
    pub async fn recommend_candidates(
        &self,
        posting_id: Uuid,
        owner_id: Uuid,
    ) -> AppResult<Vec<Recommendation>> {
        let posting = self.owned_posting(posting_id, owner_id).await?;

        let roles: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|role| posting.audience.admits(posting.owner_role, *role))
            .filter(|role| posting.capacity.limit(*role) > 0)
            .collect();
        let candidates = self
            .users
            .list_by_roles(&roles)
            .await?
            .into_iter()
            .filter(|user| user.id != posting.owner_id);

        let mut recommendations = Vec::new();
        for rec in rank_candidates(&self.taxonomy, &posting, candidates, usize::MAX) {
            if recommendations.len() == self.recommendation_limit {
                break;
            }
            if self.requests.find(posting.id, rec.user.id).await?.is_none() {
                recommendations.push(rec);
            }
        }

        Ok(recommendations)
    }
}
