use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{Visit, Vitals};

pub fn insert_visit(conn: &Connection, visit: &Visit) -> Result<(), DatabaseError> {
    let vitals_json = visit.vitals.as_ref().map(serde_json::to_string).transpose()?;
    let medications_json = serde_json::to_string(&visit.medications)?;

    conn.execute(
        "INSERT INTO visits (id, patient_id, subjective, objective, assessment, plan,
         vitals, medications, audio_url, transcript, generated_summary, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            visit.id,
            visit.patient_id,
            visit.subjective,
            visit.objective,
            visit.assessment,
            visit.plan,
            vitals_json,
            medications_json,
            visit.audio_url,
            visit.transcript,
            visit.generated_summary,
            visit.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_visit(conn: &Connection, id: &str) -> Result<Option<Visit>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, subjective, objective, assessment, plan,
         vitals, medications, audio_url, transcript, generated_summary, created_at
         FROM visits WHERE id = ?1",
    )?;

    let row = stmt
        .query_row(params![id], |row| Ok(visit_row_from_rusqlite(row)))
        .optional()?;

    match row {
        Some(row) => Ok(Some(visit_from_row(row?)?)),
        None => Ok(None),
    }
}

pub fn list_visits_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<Visit>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, subjective, objective, assessment, plan,
         vitals, medications, audio_url, transcript, generated_summary, created_at
         FROM visits WHERE patient_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![patient_id], |row| Ok(visit_row_from_rusqlite(row)))?;

    let mut visits = Vec::new();
    for row in rows {
        visits.push(visit_from_row(row??)?);
    }
    Ok(visits)
}

/// Write the transcript and generated summary onto an existing visit.
pub fn set_transcription(
    conn: &Connection,
    visit_id: &str,
    transcript: &str,
    summary: &str,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE visits SET transcript = ?1, generated_summary = ?2 WHERE id = ?3",
        params![transcript, summary, visit_id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity: "visit",
            id: visit_id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Visit mapping
struct VisitRow {
    id: String,
    patient_id: String,
    subjective: Option<String>,
    objective: Option<String>,
    assessment: Option<String>,
    plan: Option<String>,
    vitals: Option<String>,
    medications: String,
    audio_url: Option<String>,
    transcript: Option<String>,
    generated_summary: Option<String>,
    created_at: String,
}

fn visit_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<VisitRow, rusqlite::Error> {
    Ok(VisitRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        subjective: row.get(2)?,
        objective: row.get(3)?,
        assessment: row.get(4)?,
        plan: row.get(5)?,
        vitals: row.get(6)?,
        medications: row.get(7)?,
        audio_url: row.get(8)?,
        transcript: row.get(9)?,
        generated_summary: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn visit_from_row(row: VisitRow) -> Result<Visit, DatabaseError> {
    let vitals: Option<Vitals> = row.vitals.as_deref().map(serde_json::from_str).transpose()?;
    let medications: Vec<String> = serde_json::from_str(&row.medications)?;

    Ok(Visit {
        id: row.id,
        patient_id: row.patient_id,
        subjective: row.subjective,
        objective: row.objective,
        assessment: row.assessment,
        plan: row.plan,
        vitals,
        medications,
        audio_url: row.audio_url,
        transcript: row.transcript,
        generated_summary: row.generated_summary,
        created_at: row.created_at,
    })
}

// ═══════════════════════════════════════════════════════════
// rusqlite optional helper
// ═══════════════════════════════════════════════════════════

/// Extension trait to convert NotFound into None.
trait OptionalRow<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalRow<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
