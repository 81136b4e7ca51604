//! API error type with the flat failure envelope.
//!
//! Every failure inside a handler surfaces as HTTP 500 with
//! `{"success": false, "error": "..."}`, the single error contract the
//! recording client understands. The body carries a short per-variant
//! message only; the underlying detail (upstream urls, entity ids,
//! causes) is logged and never reaches the wire.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;
use crate::transcribe::ExternalApiError;

/// Failure response body.
#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub success: bool,
    pub error: String,
}

/// API-level errors. All map to HTTP 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid audio payload: {0}")]
    InvalidAudio(String),
    #[error("Transcription failed: {0}")]
    Transcription(ExternalApiError),
    #[error("Summarization failed: {0}")]
    Summarization(ExternalApiError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Detail stays in the log; the body carries only the generic message.
        tracing::error!(error = %self, "request failed");

        let message = match &self {
            ApiError::InvalidAudio(_) => "Invalid audio payload",
            ApiError::Transcription(_) => "Transcription failed",
            ApiError::Summarization(_) => "Summarization failed",
            ApiError::Database(_) => "Database error",
            ApiError::Internal(_) => "Internal error",
        };

        let body = FailureBody {
            success: false,
            error: message.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
