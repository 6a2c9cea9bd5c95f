use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

use crate::db::Role;

pub type AppResult<T> = Result<T, AppError>;

/// Every failure the engine surfaces to its callers.
///
/// The first five are recoverable and leave stored state untouched. `Store` and
/// `Internal` are propagated as-is; no operation commits half of its writes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("a request for this posting already exists")]
    DuplicateRequest,

    #[error("not permitted")]
    Unauthorized,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("capacity reached for {role} participants")]
    CapacityExceeded { role: Role },

    #[error("not found")]
    NotFound,

    #[error("store: {0}")]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::DuplicateRequest
            | AppError::InvalidState(_)
            | AppError::CapacityExceeded { .. } => (StatusCode::CONFLICT, self.to_string()),
            // unauthorized callers get the same answer as a missing resource
            AppError::Unauthorized | AppError::NotFound => {
                (StatusCode::NOT_FOUND, "not found".to_owned())
            }
            AppError::Store(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "collaboration engine failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
