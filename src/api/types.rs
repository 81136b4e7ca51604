//! Shared types for the API layer.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::transcribe::{SummarizationClient, TranscriptionClient};

/// Shared context for all API routes.
///
/// Everything is injected at construction — the database connection and
/// both external-service clients — so tests can swap in mocks and an
/// in-memory database.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<Mutex<Connection>>,
    pub transcriber: Arc<dyn TranscriptionClient>,
    pub summarizer: Arc<dyn SummarizationClient>,
}

impl ApiContext {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        transcriber: Arc<dyn TranscriptionClient>,
        summarizer: Arc<dyn SummarizationClient>,
    ) -> Self {
        Self {
            db,
            transcriber,
            summarizer,
        }
    }
}
