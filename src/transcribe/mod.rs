//! Clients for the external transcription and summarization services.
//!
//! Both are synchronous HTTP clients behind small traits so the API layer
//! can swap in mocks. Callers on an async runtime must go through
//! `spawn_blocking`.

pub mod client;

pub use client::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExternalApiError {
    #[error("Service is not reachable at {0}")]
    Unreachable(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Service returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}
