//! Transcription service API.
//!
//! Exposes the visit transcription pipeline as HTTP endpoints. The router
//! is composable — `api_router()` returns a `Router` that can be mounted
//! on any axum server instance; `server` owns the bind/shutdown lifecycle.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServerHandle, ApiSession};
pub use types::ApiContext;
