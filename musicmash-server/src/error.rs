//! Error types for the HTTP API
//!
//! Every error renders as a flat JSON body `{"error": "<message>"}`;
//! upstream failures also carry the provider's `status`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session cookie, or the session is unknown (401)
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The session carries an error tag, e.g. after a failed refresh (401)
    #[error("Token error")]
    TokenError,

    /// Provider answered with a non-2xx status; mirrored to the caller
    #[error("Failed to fetch top tracks")]
    Upstream { status: u16 },

    /// Network failure talking to the provider (500)
    #[error("Internal server error")]
    Transport,

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Request conflicts with current state (409)
    #[error("{0}")]
    Conflict(String),

    /// Operation not allowed on this resource (403)
    #[error("{0}")]
    Forbidden(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// musicmash-common error
    #[error("Common error: {0}")]
    Common(#[from] musicmash_common::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotAuthenticated | ApiError::TokenError => StatusCode::UNAUTHORIZED,
            ApiError::Upstream { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Transport | ApiError::Internal(_) | ApiError::Common(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Upstream { status } => json!({
                "error": self.to_string(),
                "status": status,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
