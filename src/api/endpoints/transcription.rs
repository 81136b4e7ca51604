//! Visit transcription endpoint.
//!
//! `POST /api/transcribe` takes base64 audio and a visit id, runs the
//! audio through the transcription service and the resulting transcript
//! through the summarization service, persists both onto the visit, and
//! records a best-effort audit row whether the run succeeded or not.

use axum::extract::State;
use axum::Json;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{
    insert_transcription_audit, set_transcription, TranscriptionAuditEntry,
};

/// Hard cap on decoded audio size (25 MB).
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Base64 input is decoded in chunks of this many characters.
/// Must be a multiple of 4 so chunk boundaries fall between quartets.
const DECODE_CHUNK_SIZE: usize = 64 * 1024;

/// System prompt sent with every summarization request.
pub const CLINICAL_NOTE_SYSTEM_PROMPT: &str = "You are a clinical documentation assistant. \
Summarize the following visit transcript into a concise clinical note with Chief Complaint, \
History of Present Illness, Assessment, and Plan sections. Use professional medical \
terminology, preserve medication names and dosages exactly as stated, and do not add \
findings that are not in the transcript.";

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    /// Base64 audio, with or without a `data:` URL prefix.
    pub audio: String,
    pub visit_id: String,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub success: bool,
    pub transcript: String,
    pub summary: String,
}

/// `POST /api/transcribe` — transcribe and summarize a visit recording.
pub async fn transcribe(
    State(ctx): State<ApiContext>,
    Json(request): Json<TranscribeRequest>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let audio = decode_audio(&request.audio)?;
    tracing::info!(
        visit_id = %request.visit_id,
        audio_bytes = audio.len(),
        "transcription requested"
    );

    let visit_id = request.visit_id;

    // Run blocking HTTP + DB work on a dedicated thread
    let (transcript, summary) =
        tokio::task::spawn_blocking(move || run_pipeline(&ctx, &visit_id, &audio))
            .await
            .map_err(|e| ApiError::Internal(format!("transcription task failed: {e}")))??;

    Ok(Json(TranscribeResponse {
        success: true,
        transcript,
        summary,
    }))
}

fn run_pipeline(
    ctx: &ApiContext,
    visit_id: &str,
    audio: &[u8],
) -> Result<(String, String), ApiError> {
    let result = transcribe_and_persist(ctx, visit_id, audio);
    record_audit(ctx, visit_id, audio.len(), &result);
    result
}

fn transcribe_and_persist(
    ctx: &ApiContext,
    visit_id: &str,
    audio: &[u8],
) -> Result<(String, String), ApiError> {
    let transcript = ctx
        .transcriber
        .transcribe(audio)
        .map_err(ApiError::Transcription)?;
    let summary = ctx
        .summarizer
        .summarize(&transcript, CLINICAL_NOTE_SYSTEM_PROMPT)
        .map_err(ApiError::Summarization)?;

    let conn = ctx
        .db
        .lock()
        .map_err(|_| ApiError::Internal("lock poisoned".into()))?;
    set_transcription(&conn, visit_id, &transcript, &summary)?;

    tracing::info!(
        visit_id,
        transcript_chars = transcript.chars().count(),
        "transcription persisted"
    );

    Ok((transcript, summary))
}

/// Best-effort in both directions: failed runs still get a row, and a
/// failed insert is logged, never surfaced.
fn record_audit(
    ctx: &ApiContext,
    visit_id: &str,
    audio_bytes: usize,
    result: &Result<(String, String), ApiError>,
) {
    let (outcome, transcript_chars, summary_chars) = match result {
        Ok((transcript, summary)) => (
            "success",
            transcript.chars().count() as i64,
            summary.chars().count() as i64,
        ),
        Err(e) => (failed_stage(e), 0, 0),
    };

    let conn = match ctx.db.lock() {
        Ok(conn) => conn,
        Err(_) => {
            tracing::warn!(visit_id, "skipping audit row, database lock poisoned");
            return;
        }
    };
    let entry = TranscriptionAuditEntry {
        id: Uuid::new_v4(),
        visit_id: visit_id.to_string(),
        audio_bytes: audio_bytes as i64,
        transcript_chars,
        summary_chars,
        outcome: outcome.to_string(),
        created_at: Utc::now(),
    };
    if let Err(e) = insert_transcription_audit(&conn, &entry) {
        tracing::warn!(visit_id, error = %e, "failed to record transcription audit row");
    }
}

fn failed_stage(error: &ApiError) -> &'static str {
    match error {
        ApiError::Transcription(_) => "transcription_failed",
        ApiError::Summarization(_) => "summarization_failed",
        _ => "persist_failed",
    }
}

/// Decode the base64 payload in bounded chunks.
///
/// A `data:audio/...;base64,` prefix is stripped by dropping everything up
/// to the first comma. The size cap is enforced on the encoded length
/// before any bytes are decoded.
fn decode_audio(payload: &str) -> Result<Vec<u8>, ApiError> {
    let encoded = match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    };
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(ApiError::InvalidAudio("empty audio payload".into()));
    }
    // 4 base64 characters decode to 3 bytes
    if encoded.len() / 4 * 3 > MAX_AUDIO_BYTES {
        return Err(ApiError::InvalidAudio(format!(
            "audio exceeds the {MAX_AUDIO_BYTES}-byte limit"
        )));
    }

    let mut decoded = Vec::with_capacity(encoded.len() / 4 * 3);
    for chunk in encoded.as_bytes().chunks(DECODE_CHUNK_SIZE) {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(chunk)
            .map_err(|e| ApiError::InvalidAudio(e.to_string()))?;
        decoded.extend_from_slice(&bytes);
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn decodes_plain_base64() {
        let decoded = decode_audio(&encode(b"some audio bytes")).unwrap();
        assert_eq!(decoded, b"some audio bytes");
    }

    #[test]
    fn strips_data_url_prefix() {
        let payload = format!("data:audio/webm;base64,{}", encode(b"webm bytes"));
        let decoded = decode_audio(&payload).unwrap();
        assert_eq!(decoded, b"webm bytes");
    }

    #[test]
    fn decodes_across_chunk_boundaries() {
        let original: Vec<u8> = (0..150_000u32).map(|i| (i % 251) as u8).collect();
        let encoded = encode(&original);
        assert!(encoded.len() > 2 * DECODE_CHUNK_SIZE);

        let decoded = decode_audio(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(decode_audio("").is_err());
        assert!(decode_audio("data:audio/webm;base64,").is_err());
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(decode_audio("not valid base64!!").is_err());
    }

    #[test]
    fn oversized_payload_is_rejected() {
        // Encoded length just over the cap; rejected before decoding
        let payload = "A".repeat(MAX_AUDIO_BYTES / 3 * 4 + 8);
        let err = decode_audio(&payload).unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn chunk_size_is_quartet_aligned() {
        assert_eq!(DECODE_CHUNK_SIZE % 4, 0);
    }
}
