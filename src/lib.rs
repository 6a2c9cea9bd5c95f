//! Collaboration matching and capacity-constrained join requests for the campus
//! community platform.
//!
//! Both personal projects and faculty collaborations are [`db::Posting`]s. Candidates
//! find them through [`Engine::browse`], apply with [`Engine::create_request`] or get
//! invited with [`Engine::create_invitation`], and the counterparty settles the request
//! with [`Engine::respond`], which re-checks the role's capacity at that moment.

pub mod appresult;
pub mod config;
pub mod db;
pub mod matching;
pub mod postings;
pub mod requests;
pub mod store;
pub mod taxonomy;

use std::sync::Arc;

use uuid::Uuid;

pub use appresult::{AppError, AppResult};
pub use config::Config;
pub use taxonomy::Taxonomy;

use db::{Posting, User};
use store::{PostingStore, RequestStore, SqliteStore, UserStore};

const DEFAULT_RECOMMENDATION_LIMIT: usize = 6;

/// Stores plus the skill taxonomy. Cheap to clone; hand one to every handler.
#[derive(Clone)]
pub struct Engine {
    pub users: Arc<dyn UserStore>,
    pub postings: Arc<dyn PostingStore>,
    pub requests: Arc<dyn RequestStore>,
    pub taxonomy: Arc<Taxonomy>,
    pub recommendation_limit: usize,
}

impl Engine {
    /// One backend serving all three store roles.
    pub fn new<S>(store: S, taxonomy: Taxonomy) -> Self
    where
        S: UserStore + PostingStore + RequestStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            postings: store.clone(),
            requests: store,
            taxonomy: Arc::new(taxonomy),
            recommendation_limit: DEFAULT_RECOMMENDATION_LIMIT,
        }
    }

    pub fn with_stores(
        users: Arc<dyn UserStore>,
        postings: Arc<dyn PostingStore>,
        requests: Arc<dyn RequestStore>,
        taxonomy: Arc<Taxonomy>,
    ) -> Self {
        Self {
            users,
            postings,
            requests,
            taxonomy,
            recommendation_limit: DEFAULT_RECOMMENDATION_LIMIT,
        }
    }

    pub fn with_recommendation_limit(mut self, limit: usize) -> Self {
        self.recommendation_limit = limit;
        self
    }

    /// Opens the configured SQLite database and loads the configured taxonomy.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = SqliteStore::connect(&config.database_url, config.max_connections).await?;
        let taxonomy = config.taxonomy()?;

        Ok(Self::new(store, taxonomy).with_recommendation_limit(config.recommendation_limit))
    }

    pub(crate) async fn posting(&self, id: Uuid) -> AppResult<Posting> {
        self.postings.get(id).await?.ok_or(AppError::NotFound)
    }

    pub(crate) async fn user(&self, id: Uuid) -> AppResult<User> {
        self.users.get_profile(id).await?.ok_or(AppError::NotFound)
    }

    /// The posting, provided `actor` owns it.
    pub(crate) async fn owned_posting(&self, id: Uuid, actor: Uuid) -> AppResult<Posting> {
        let posting = self.posting(id).await?;
        if posting.owner_id != actor {
            tracing::warn!(posting = %id, actor = %actor, "owner-only action by non-owner");
            return Err(AppError::Unauthorized);
        }
        Ok(posting)
    }
}
