//! Error types for the store and for request handling.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failure to persist the document, or of the blocking task doing the file I/O.
/// Loading itself never fails; see `db::Store::load`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize projects: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage task did not finish: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Errors a tracker operation can report back to its caller.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Project not found")]
    NotFound,
    #[error("Invalid task index")]
    InvalidTaskIndex,
    #[error("Invalid stall period: {0}")]
    InvalidStallPeriod(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TrackerError {
    pub fn status(&self) -> StatusCode {
        match self {
            TrackerError::NotFound => StatusCode::NOT_FOUND,
            TrackerError::InvalidTaskIndex | TrackerError::InvalidStallPeriod(_) => {
                StatusCode::BAD_REQUEST
            }
            TrackerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Plain-text bodies, never JSON or templated pages.
impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let body = match &self {
            TrackerError::NotFound => "Project not found",
            TrackerError::InvalidTaskIndex => "Invalid task index",
            TrackerError::InvalidStallPeriod(_) => "Invalid stall period",
            TrackerError::Store(e) => {
                tracing::error!(error = %e, "store write failed");
                "Failed to save projects"
            }
        };
        (self.status(), body).into_response()
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
