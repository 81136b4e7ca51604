//! Connection setup for the service database.
//!
//! One SQLite file holds the endpoint-side state: visit notes and the
//! transcription audit trail. Schema changes ship as numbered SQL files
//! compiled into the binary; `schema_version` records the highest one
//! applied, so reopening an existing file only runs what is missing.

use std::path::Path;

use rusqlite::Connection;

use super::DatabaseError;

/// Applied in order; each entry bumps `schema_version` as its last statement.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../resources/migrations/001_initial.sql")),
    (2, include_str!("../../resources/migrations/002_audit_outcome.sql")),
];

/// Open (creating if needed) the database file and bring it up to date.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    tracing::debug!(path = %path.display(), "opening database");
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// In-memory variant for tests; same pragmas and schema.
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    // WAL keeps the audit insert from blocking concurrent visit reads.
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let applied = current_schema_version(conn);
    for &(version, sql) in MIGRATIONS {
        if version > applied {
            tracing::info!(version, "applying schema migration");
            conn.execute_batch(sql)
                .map_err(|e| DatabaseError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                })?;
        }
    }
    Ok(())
}

/// Highest applied migration, 0 for a database with no schema yet.
fn current_schema_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .unwrap_or(0)
}
