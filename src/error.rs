//! # error
//!
//! Centralised application error type.
//!
//! Every handler returns `Result<_, AppError>`.  Axum's `IntoResponse` impl
//! turns these into JSON error bodies.  Internal failures never leak their
//! cause to the caller: the detail is logged, the body stays generic.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or mismatching `x-line-signature`.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The request body could not be read.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A per-event handler failed (model call, reply send, ...).
    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "ok":    false,
            "error": message,
        }));

        (status, body).into_response()
    }
}
