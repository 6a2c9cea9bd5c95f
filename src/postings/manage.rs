use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::{NewPosting, Posting, PostingStatus, PostingUpdate, Role},
    taxonomy::extract_terms,
    AppError, AppResult, Engine,
};

impl Engine {
    pub async fn create_posting(&self, owner_id: Uuid, new: NewPosting) -> AppResult<Posting> {
        let owner = self.user(owner_id).await?;

        let title = new.title.trim();
        if title.is_empty() {
            return Err(AppError::invalid_state("a posting needs a title"));
        }

        let posting = Posting {
            id: Uuid::now_v7(),
            owner_id: owner.id,
            owner_role: owner.role,
            kind: new.kind,
            title: title.to_owned(),
            description: new.description,
            terms: new.terms,
            audience: new.audience,
            capacity: new.capacity,
            strict_visibility: new.strict_visibility,
            status: PostingStatus::Open,
            must_have: extract_terms(&new.must_have),
            nice_to_have: extract_terms(&new.nice_to_have),
            apply_deadline: new.apply_deadline,
            created_at: OffsetDateTime::now_utc(),
        };
        self.postings.insert(&posting).await?;

        info!(posting = %posting.id, owner = %owner.id, kind = %posting.kind, "posting created");
        Ok(posting)
    }

    /// Owner edit. Capacity may not drop below what is already accepted for a role;
    /// the store repeats that check as part of the write.
    pub async fn update_posting(
        &self,
        posting_id: Uuid,
        owner_id: Uuid,
        update: PostingUpdate,
    ) -> AppResult<Posting> {
        let existing = self.owned_posting(posting_id, owner_id).await?;

        let title = update.title.trim();
        if title.is_empty() {
            return Err(AppError::invalid_state("a posting needs a title"));
        }
        for role in Role::ALL {
            let limit = update.capacity.limit(role);
            let accepted = self.postings.count_accepted(existing.id, role).await?;
            if limit < accepted {
                return Err(AppError::invalid_state(format!(
                    "{role} capacity {limit} is below the {accepted} already accepted"
                )));
            }
        }

        let posting = Posting {
            title: title.to_owned(),
            description: update.description,
            terms: update.terms,
            audience: update.audience,
            capacity: update.capacity,
            strict_visibility: update.strict_visibility,
            must_have: extract_terms(&update.must_have),
            nice_to_have: extract_terms(&update.nice_to_have),
            apply_deadline: update.apply_deadline,
            ..existing
        };
        if !self.postings.update(&posting).await? {
            // an acceptance landed after the counts above were taken
            return Err(AppError::invalid_state(
                "capacity is below the participants already accepted",
            ));
        }

        info!(posting = %posting.id, "posting updated");
        Ok(posting)
    }

    /// Stops new requests and acceptances. Accepted participants stay.
    pub async fn close_posting(&self, posting_id: Uuid, owner_id: Uuid) -> AppResult<()> {
        let posting = self.owned_posting(posting_id, owner_id).await?;

        if !self.postings.close(posting.id).await? {
            return Err(AppError::invalid_state("posting is already closed"));
        }

        info!(posting = %posting.id, "posting closed");
        Ok(())
    }
}
