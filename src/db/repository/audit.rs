use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;

/// One transcription run against a visit, successful or not. Written
/// best-effort alongside the run; sizes and outcome only, never audio or
/// text content.
#[derive(Debug, Clone)]
pub struct TranscriptionAuditEntry {
    pub id: Uuid,
    pub visit_id: String,
    pub audio_bytes: i64,
    /// Zero for runs that failed before anything was persisted.
    pub transcript_chars: i64,
    pub summary_chars: i64,
    /// `"success"` or the failed stage, e.g. `"transcription_failed"`.
    pub outcome: String,
    pub created_at: DateTime<Utc>,
}

pub fn insert_transcription_audit(
    conn: &Connection,
    entry: &TranscriptionAuditEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO transcription_audit (id, visit_id, audio_bytes, transcript_chars, summary_chars, outcome, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.id.to_string(),
            entry.visit_id,
            entry.audio_bytes,
            entry.transcript_chars,
            entry.summary_chars,
            entry.outcome,
            entry.created_at,
        ],
    )?;
    Ok(())
}

pub fn list_transcription_audit(
    conn: &Connection,
    visit_id: &str,
) -> Result<Vec<TranscriptionAuditEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, visit_id, audio_bytes, transcript_chars, summary_chars, outcome, created_at
         FROM transcription_audit WHERE visit_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![visit_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, DateTime<Utc>>(6)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, visit_id, audio_bytes, transcript_chars, summary_chars, outcome, created_at) =
            row?;
        let id = Uuid::parse_str(&id)
            .map_err(|_| DatabaseError::CorruptId { value: id.clone() })?;
        entries.push(TranscriptionAuditEntry {
            id,
            visit_id,
            audio_bytes,
            transcript_chars,
            summary_chars,
            outcome,
            created_at,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::insert_visit;
    use crate::models::Visit;

    fn test_db() -> Connection {
        let conn = open_memory_database().unwrap();
        insert_visit(
            &conn,
            &Visit {
                id: "v1".to_string(),
                patient_id: "p1".to_string(),
                subjective: None,
                objective: None,
                assessment: None,
                plan: None,
                vitals: None,
                medications: vec![],
                audio_url: None,
                transcript: None,
                generated_summary: None,
                created_at: "2026-08-10T14:30:00Z".to_string(),
            },
        )
        .unwrap();
        conn
    }

    fn sample_entry(visit_id: &str) -> TranscriptionAuditEntry {
        TranscriptionAuditEntry {
            id: Uuid::new_v4(),
            visit_id: visit_id.to_string(),
            audio_bytes: 48_000,
            transcript_chars: 1_200,
            summary_chars: 300,
            outcome: "success".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_list_round_trip() {
        let conn = test_db();
        let entry = sample_entry("v1");
        insert_transcription_audit(&conn, &entry).unwrap();

        let entries = list_transcription_audit(&conn, "v1").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, entry.id);
        assert_eq!(entries[0].audio_bytes, 48_000);
        assert_eq!(entries[0].outcome, "success");
    }

    #[test]
    fn failed_run_rows_keep_their_outcome() {
        let conn = test_db();
        let mut entry = sample_entry("v1");
        entry.transcript_chars = 0;
        entry.summary_chars = 0;
        entry.outcome = "transcription_failed".to_string();
        insert_transcription_audit(&conn, &entry).unwrap();

        let entries = list_transcription_audit(&conn, "v1").unwrap();
        assert_eq!(entries[0].outcome, "transcription_failed");
        assert_eq!(entries[0].transcript_chars, 0);
    }

    #[test]
    fn insert_for_missing_visit_violates_foreign_key() {
        let conn = test_db();
        let result = insert_transcription_audit(&conn, &sample_entry("v404"));
        assert!(matches!(result, Err(DatabaseError::Sqlite(_))));
    }

    #[test]
    fn list_for_other_visit_is_empty() {
        let conn = test_db();
        insert_transcription_audit(&conn, &sample_entry("v1")).unwrap();
        assert!(list_transcription_audit(&conn, "v2").unwrap().is_empty());
    }
}
