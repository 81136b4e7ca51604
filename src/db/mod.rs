pub mod repository;
pub mod sqlite;

pub use repository::*;
pub use sqlite::*;

use thiserror::Error;

/// Failures from the SQLite persistence layer.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A JSON column (`vitals`, `medications`) failed to serialize on the
    /// way in or parse on the way out.
    #[error("JSON column error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("unrecognized {field} value: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("stored audit id {value} is not a UUID")]
    CorruptId { value: String },

    #[error("schema migration v{version} failed: {reason}")]
    MigrationFailed { version: i64, reason: String },
}
