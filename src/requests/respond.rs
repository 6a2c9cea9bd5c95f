use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::{Decision, Request, RequestStatus},
    store::CapacityGuard,
    AppError, AppResult, Engine,
};

impl Engine {
    /// Settles a pending request. Only the counterparty may decide: the owner for a
    /// join request, the invitee for an invitation.
    ///
    /// Accepting counts the requester's role on the posting now, not when the request
    /// was made, and the store write is conditional on the posting still being open
    /// and that count still being below the limit. A refused acceptance leaves the
    /// request pending.
    pub async fn respond(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        decision: Decision,
    ) -> AppResult<Request> {
        let request = self.requests.get(request_id).await?.ok_or(AppError::NotFound)?;
        let posting = self.posting(request.posting_id).await?;

        if request.decider(&posting) != actor_id {
            warn!(request = %request.id, actor = %actor_id, "decision by non-counterparty");
            return Err(AppError::Unauthorized);
        }
        if request.status != RequestStatus::Pending {
            return Err(AppError::invalid_state(format!("request already {}", request.status)));
        }

        let guard = match decision {
            Decision::Rejected => None,
            Decision::Accepted => {
                if !posting.is_open() {
                    return Err(AppError::invalid_state("posting is closed"));
                }

                let role = self.user(request.requester_id).await?.role;
                let limit = posting.capacity.limit(role);
                let accepted = self.postings.count_accepted(posting.id, role).await?;
                if accepted >= limit {
                    info!(request = %request.id, %role, accepted, limit, "capacity reached, request stays pending");
                    return Err(AppError::CapacityExceeded { role });
                }

                Some(CapacityGuard { posting_id: posting.id, role, limit })
            }
        };

        let status = RequestStatus::from(decision);
        if !self.requests.update_status(request.id, status, guard).await? {
            // someone else got there between our read and the write
            let current = self.requests.get(request.id).await?.ok_or(AppError::NotFound)?;
            let (RequestStatus::Pending, Some(CapacityGuard { role, .. })) = (current.status, guard)
            else {
                return Err(AppError::invalid_state(format!("request already {}", current.status)));
            };
            if !self.posting(posting.id).await?.is_open() {
                info!(request = %request.id, "posting closed before the acceptance landed");
                return Err(AppError::invalid_state("posting is closed"));
            }
            info!(request = %request.id, %role, "lost the last slot to a concurrent acceptance");
            return Err(AppError::CapacityExceeded { role });
        }

        info!(request = %request.id, posting = %posting.id, %status, "request settled");
        Ok(Request { status, ..request })
    }
}
