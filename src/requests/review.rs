use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    db::{Posting, Request, User},
    matching::{score_user, MatchScore},
    AppResult, Engine,
};

/// A pending request with the match badge the owner sees next to it.
#[derive(Debug, Clone, Serialize)]
pub struct Applicant {
    pub request: Request,
    pub user: User,
    pub score: MatchScore,
}

/// One of the candidate's own requests, with the posting it is for.
#[derive(Debug, Clone, Serialize)]
pub struct OwnRequest {
    pub request: Request,
    pub posting: Posting,
}

/// Everything an owner manages, in one read.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub open: Vec<Posting>,
    pub closed: Vec<Posting>,
    /// Pending join requests across all of the owner's postings.
    pub incoming: Vec<Applicant>,
}

impl Engine {
    /// Owner-only: pending requests on the posting, newest first.
    pub async fn pending_applicants(
        &self,
        posting_id: Uuid,
        owner_id: Uuid,
    ) -> AppResult<Vec<Applicant>> {
        let posting = self.owned_posting(posting_id, owner_id).await?;

        let mut applicants = Vec::new();
        for request in self.requests.list_pending(posting.id).await? {
            if let Some(applicant) = self.applicant(&posting, request).await? {
                applicants.push(applicant);
            }
        }

        Ok(applicants)
    }

    pub async fn dashboard(&self, owner_id: Uuid) -> AppResult<Dashboard> {
        let owner = self.user(owner_id).await?;

        let (open, closed): (Vec<Posting>, Vec<Posting>) = self
            .postings
            .list_owned(owner.id)
            .await?
            .into_iter()
            .partition(Posting::is_open);

        let mut incoming = Vec::new();
        for request in self.requests.list_incoming(owner.id).await? {
            let Some(posting) = open
                .iter()
                .chain(&closed)
                .find(|posting| posting.id == request.posting_id)
            else {
                continue;
            };
            if let Some(applicant) = self.applicant(posting, request).await? {
                incoming.push(applicant);
            }
        }

        Ok(Dashboard { open, closed, incoming })
    }

    /// The user's own requests and invitations in every state, newest first.
    pub async fn my_requests(&self, requester_id: Uuid) -> AppResult<Vec<OwnRequest>> {
        let requester = self.user(requester_id).await?;

        let mut mine = Vec::new();
        for request in self.requests.list_for_requester(requester.id).await? {
            let Some(posting) = self.postings.get(request.posting_id).await? else {
                warn!(request = %request.id, "request on a missing posting");
                continue;
            };
            mine.push(OwnRequest { request, posting });
        }

        Ok(mine)
    }

    async fn applicant(&self, posting: &Posting, request: Request) -> AppResult<Option<Applicant>> {
        let Some(user) = self.users.get_profile(request.requester_id).await? else {
            warn!(request = %request.id, "pending request from a missing user");
            return Ok(None);
        };

        let score = score_user(&self.taxonomy, posting, &user);
        Ok(Some(Applicant { request, user, score }))
    }
}
