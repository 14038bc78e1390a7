use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// The whole error taxonomy of the service. Every variant surfaces as a
/// status code plus an `{"error": ...}` body; storage causes are logged
/// server-side and never leak to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("username already exists")]
    DuplicateUsername,
    /// Uniform for "no such user" and "wrong password" so responses cannot
    /// be used to enumerate usernames.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Missing, malformed and expired tokens all land here; the gate logs
    /// which kind it saw.
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("admin only")]
    Forbidden,
    /// Entry absent or owned by someone else — deliberately the same.
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Invalid(&'static str),
    #[error("database error")]
    Storage(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::DuplicateUsername => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Storage(cause) = &self {
            error!("storage failure: {cause:#}");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Storage(e)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Storage(anyhow::anyhow!("blocking task failed: {e}"))
    }
}
