use tracing::info;
use uuid::Uuid;

use crate::{
    db::{Request, RequestOrigin},
    AppError, AppResult, Engine,
};

use super::{clean_message, ensure_accepting};

impl Engine {
    /// A candidate asks to join. Fails with `DuplicateRequest` if any request, in any
    /// state, already exists for the pair.
    pub async fn create_request(
        &self,
        posting_id: Uuid,
        requester_id: Uuid,
        message: Option<String>,
    ) -> AppResult<Request> {
        let posting = self.posting(posting_id).await?;
        let requester = self.user(requester_id).await?;

        if posting.owner_id == requester.id {
            return Err(AppError::invalid_state("owners cannot join their own posting"));
        }
        if self.requests.find(posting.id, requester.id).await?.is_some() {
            return Err(AppError::DuplicateRequest);
        }
        ensure_accepting(&posting)?;

        let request = Request::pending(
            posting.id,
            requester.id,
            RequestOrigin::Join,
            clean_message(message),
        );
        self.requests.insert(&request).await?;

        info!(request = %request.id, posting = %posting.id, requester = %requester.id, "join request created");
        Ok(request)
    }

    /// The owner invites a candidate whose role the audience admits; the invitee decides.
    pub async fn create_invitation(
        &self,
        posting_id: Uuid,
        invitee_id: Uuid,
        owner_id: Uuid,
        message: Option<String>,
    ) -> AppResult<Request> {
        let posting = self.owned_posting(posting_id, owner_id).await?;
        let invitee = self.user(invitee_id).await?;

        if invitee.id == posting.owner_id {
            return Err(AppError::invalid_state("owners cannot invite themselves"));
        }
        if !posting.audience.admits(posting.owner_role, invitee.role) {
            return Err(AppError::invalid_state(format!(
                "posting is not open to {}s",
                invitee.role
            )));
        }
        if self.requests.find(posting.id, invitee.id).await?.is_some() {
            return Err(AppError::DuplicateRequest);
        }
        ensure_accepting(&posting)?;

        let request = Request::pending(
            posting.id,
            invitee.id,
            RequestOrigin::Invite,
            clean_message(message),
        );
        self.requests.insert(&request).await?;

        info!(request = %request.id, posting = %posting.id, invitee = %invitee.id, "invitation created");
        Ok(request)
    }
}
