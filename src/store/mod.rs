//! Persistence seams. The engine only ever talks to these traits; `SqliteStore`
//! implements all three over one pool.

mod sqlite;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::{Posting, PostingKind, Request, RequestStatus, Role, User},
    AppResult,
};

pub use sqlite::SqliteStore;

/// Makes a status update conditional on the posting still being open with a free
/// slot for `role`. The count and the write must happen as one atomic step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityGuard {
    pub posting_id: Uuid,
    pub role: Role,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostingFilter {
    pub owner_id: Option<Uuid>,
    pub kind: Option<PostingKind>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn list_by_roles(&self, roles: &[Role]) -> AppResult<Vec<User>>;
}

#[async_trait]
pub trait PostingStore: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<Posting>>;

    /// Accepted requests on `posting_id` whose requester has `role`.
    async fn count_accepted(&self, posting_id: Uuid, role: Role) -> AppResult<u32>;

    /// Open postings, newest first.
    async fn list_open(&self, filter: &PostingFilter) -> AppResult<Vec<Posting>>;

    /// Every posting the user owns, open or closed, newest first.
    async fn list_owned(&self, owner_id: Uuid) -> AppResult<Vec<Posting>>;

    async fn insert(&self, posting: &Posting) -> AppResult<()>;

    /// Rewrites the editable fields, but only if each role's accepted count still fits
    /// the new capacity at write time. Returns whether a row changed.
    async fn update(&self, posting: &Posting) -> AppResult<bool>;

    /// Moves an open posting to closed. `false` if it was not open.
    async fn close(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn find(&self, posting_id: Uuid, requester_id: Uuid) -> AppResult<Option<Request>>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Request>>;

    /// Fails with `DuplicateRequest` if the (posting, requester) pair is taken.
    async fn insert(&self, request: &Request) -> AppResult<Uuid>;

    /// Sets `status` only if the request is still pending and, when a guard is
    /// given, only if the posting is still open and the guarded role is below its
    /// limit. Returns whether a row changed.
    async fn update_status(
        &self,
        id: Uuid,
        status: RequestStatus,
        guard: Option<CapacityGuard>,
    ) -> AppResult<bool>;

    async fn list_pending(&self, posting_id: Uuid) -> AppResult<Vec<Request>>;

    /// Requests naming the user as candidate, any origin or status, newest first.
    async fn list_for_requester(&self, requester_id: Uuid) -> AppResult<Vec<Request>>;

    /// Pending join requests across all of the owner's postings, newest first.
    async fn list_incoming(&self, owner_id: Uuid) -> AppResult<Vec<Request>>;
}
