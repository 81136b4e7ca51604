//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/` and served CORS-open so the browser
//! recording client can call from any origin.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/transcribe", post(endpoints::transcription::transcribe))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    Router::new().nest("/api", routes).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use base64::Engine;
    use rusqlite::Connection;
    use tower::ServiceExt;

    use super::*;
    use crate::api::endpoints::transcription::CLINICAL_NOTE_SYSTEM_PROMPT;
    use crate::db::repository::{get_visit, list_transcription_audit};
    use crate::db::open_memory_database;
    use crate::transcribe::{MockSummarizationClient, MockTranscriptionClient};

    /// In-memory database pre-loaded with the seed visits (v1 has no
    /// transcript yet).
    fn test_db() -> Arc<Mutex<Connection>> {
        let conn = open_memory_database().unwrap();
        for visit in crate::seed::seed_visits() {
            crate::db::repository::insert_visit(&conn, &visit).unwrap();
        }
        Arc::new(Mutex::new(conn))
    }

    fn test_ctx(
        db: Arc<Mutex<Connection>>,
        transcriber: MockTranscriptionClient,
        summarizer: MockSummarizationClient,
    ) -> ApiContext {
        ApiContext::new(db, Arc::new(transcriber), Arc::new(summarizer))
    }

    fn encode(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    fn transcribe_request(audio: &str, visit_id: &str) -> Request<Body> {
        let body = serde_json::json!({ "audio": audio, "visit_id": visit_id });
        Request::builder()
            .method("POST")
            .uri("/api/transcribe")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn transcribe_returns_transcript_and_summary() {
        let db = test_db();
        let transcriber = MockTranscriptionClient::new("patient reports a dry cough");
        let summarizer = MockSummarizationClient::new("CC: dry cough.");
        let app = api_router(test_ctx(db.clone(), transcriber, summarizer.clone()));

        let response = app
            .oneshot(transcribe_request(&encode(b"audio bytes"), "v1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["transcript"], "patient reports a dry cough");
        assert_eq!(json["summary"], "CC: dry cough.");

        // Both fields persisted onto the visit
        let conn = db.lock().unwrap();
        let visit = get_visit(&conn, "v1").unwrap().unwrap();
        assert_eq!(visit.transcript.as_deref(), Some("patient reports a dry cough"));
        assert_eq!(visit.generated_summary.as_deref(), Some("CC: dry cough."));

        // Audit row recorded
        let audit = list_transcription_audit(&conn, "v1").unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].audio_bytes, b"audio bytes".len() as i64);
        assert_eq!(audit[0].outcome, "success");

        // Summarizer saw the fixed clinical prompt
        assert_eq!(
            summarizer.system_prompts(),
            vec![CLINICAL_NOTE_SYSTEM_PROMPT.to_string()]
        );
    }

    #[tokio::test]
    async fn transcription_failure_maps_to_500() {
        let db = test_db();
        let app = api_router(test_ctx(
            db.clone(),
            MockTranscriptionClient::failing(),
            MockSummarizationClient::new("unused"),
        ));

        let response = app
            .oneshot(transcribe_request(&encode(b"audio"), "v1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Transcription failed");

        // Visit untouched, but the failed run is audited
        let conn = db.lock().unwrap();
        let visit = get_visit(&conn, "v1").unwrap().unwrap();
        assert!(visit.transcript.is_none());
        let audit = list_transcription_audit(&conn, "v1").unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].outcome, "transcription_failed");
    }

    #[tokio::test]
    async fn summarization_failure_maps_to_500() {
        let db = test_db();
        let app = api_router(test_ctx(
            db.clone(),
            MockTranscriptionClient::new("words"),
            MockSummarizationClient::failing(),
        ));

        let response = app
            .oneshot(transcribe_request(&encode(b"audio"), "v1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // Nothing persisted when summarization fails
        let conn = db.lock().unwrap();
        let visit = get_visit(&conn, "v1").unwrap().unwrap();
        assert!(visit.transcript.is_none());
        assert!(visit.generated_summary.is_none());

        let audit = list_transcription_audit(&conn, "v1").unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].outcome, "summarization_failed");
        assert_eq!(audit[0].transcript_chars, 0);
    }

    #[tokio::test]
    async fn unknown_visit_maps_to_500() {
        let db = test_db();
        let app = api_router(test_ctx(
            db.clone(),
            MockTranscriptionClient::new("words"),
            MockSummarizationClient::new("note"),
        ));

        let response = app
            .oneshot(transcribe_request(&encode(b"audio"), "v404"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        // Generic message only; the missing id stays in the log
        assert_eq!(json["error"], "Database error");

        // The failure audit row has no visit to reference, so the
        // foreign key drops it and the insert is only logged
        let conn = db.lock().unwrap();
        assert!(list_transcription_audit(&conn, "v404").unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_base64_maps_to_500() {
        let app = api_router(test_ctx(
            test_db(),
            MockTranscriptionClient::new("words"),
            MockSummarizationClient::new("note"),
        ));

        let response = app
            .oneshot(transcribe_request("!!! not base64 !!!", "v1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Invalid audio payload");
    }

    #[tokio::test]
    async fn audit_failure_does_not_fail_the_request() {
        let db = test_db();
        {
            let conn = db.lock().unwrap();
            conn.execute_batch("DROP TABLE transcription_audit").unwrap();
        }
        let app = api_router(test_ctx(
            db.clone(),
            MockTranscriptionClient::new("words"),
            MockSummarizationClient::new("note"),
        ));

        let response = app
            .oneshot(transcribe_request(&encode(b"audio"), "v1"))
            .await
            .unwrap();

        // Audit insert fails (table gone) but the response is still a success
        assert_eq!(response.status(), StatusCode::OK);
        let conn = db.lock().unwrap();
        let visit = get_visit(&conn, "v1").unwrap().unwrap();
        assert_eq!(visit.transcript.as_deref(), Some("words"));
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = api_router(test_ctx(
            test_db(),
            MockTranscriptionClient::new(""),
            MockSummarizationClient::new(""),
        ));

        let request = Request::builder()
            .method("GET")
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = api_router(test_ctx(
            test_db(),
            MockTranscriptionClient::new(""),
            MockSummarizationClient::new(""),
        ));

        let request = Request::builder()
            .method("GET")
            .uri("/api/nonexistent")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn preflight_allows_any_origin() {
        let app = api_router(test_ctx(
            test_db(),
            MockTranscriptionClient::new(""),
            MockSummarizationClient::new(""),
        ));

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/transcribe")
            .header("Origin", "http://localhost:5173")
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }
}
