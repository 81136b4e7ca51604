//! API server lifecycle — starts/stops the axum HTTP server that serves
//! the transcription API.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel. The caller keeps the handle; dropping the shutdown sender
//! without sending leaves the server running until process exit.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

// ═══════════════════════════════════════════════════════════
// Public types
// ═══════════════════════════════════════════════════════════

/// Metadata for a running API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSession {
    pub session_id: String,
    /// Address actually bound; differs from the requested one when port 0
    /// was asked for.
    pub bound_addr: SocketAddr,
    pub started_at: String,
}

/// Handle to a running API server.
pub struct ApiServerHandle {
    pub session: ApiSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServerHandle {
    /// Signal the serve task to drain in-flight requests and exit. Safe to
    /// call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown requested");
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Server lifecycle
// ═══════════════════════════════════════════════════════════

/// Start the API server on the given address.
///
/// Binds the listener, builds the router around the supplied context, and
/// spawns the axum server in a background tokio task. Bind with port 0
/// for an ephemeral port (tests do).
pub async fn start_api_server(
    ctx: ApiContext,
    bind_addr: SocketAddr,
) -> Result<ApiServerHandle, String> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("listener has no local address: {e}"))?;

    let app = api_router(ctx);

    let session = ApiSession {
        session_id: Uuid::new_v4().to_string(),
        bound_addr: addr,
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        tracing::info!(%addr, "API server listening");

        let drain = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server draining");
        };

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(drain)
            .await
        {
            tracing::error!(error = %e, "API server exited abnormally");
        } else {
            tracing::info!("API server stopped");
        }
    });

    Ok(ApiServerHandle {
        session,
        shutdown_tx: Some(shutdown_tx),
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use base64::Engine;

    use super::*;
    use crate::db::open_memory_database;
    use crate::transcribe::{MockSummarizationClient, MockTranscriptionClient};

    fn test_ctx() -> ApiContext {
        let conn = open_memory_database().unwrap();
        for visit in crate::seed::seed_visits() {
            crate::db::repository::insert_visit(&conn, &visit).unwrap();
        }
        ApiContext::new(
            Arc::new(Mutex::new(conn)),
            Arc::new(MockTranscriptionClient::new("spoken words")),
            Arc::new(MockSummarizationClient::new("the note")),
        )
    }

    fn localhost() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[tokio::test]
    async fn starts_and_serves_health() {
        let mut server = start_api_server(test_ctx(), localhost())
            .await
            .expect("server should start");

        assert!(!server.session.session_id.is_empty());
        assert!(server.session.bound_addr.port() > 0);

        let url = format!("http://{}/api/health", server.session.bound_addr);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        server.shutdown();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn session_metadata_is_populated() {
        let mut server = start_api_server(test_ctx(), localhost())
            .await
            .expect("server should start");

        assert!(!server.session.started_at.is_empty());
        assert!(server.session.bound_addr.is_ipv4());

        server.shutdown();
    }

    #[tokio::test]
    async fn server_transcribes_over_http() {
        let mut server = start_api_server(test_ctx(), localhost())
            .await
            .expect("server should start");

        let audio = base64::engine::general_purpose::STANDARD.encode(b"recorded audio");
        let client = reqwest::Client::new();
        let resp = client
            .post(format!(
                "http://{}/api/transcribe",
                server.session.bound_addr
            ))
            .json(&serde_json::json!({ "audio": audio, "visit_id": "v1" }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["transcript"], "spoken words");

        server.shutdown();
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let mut server = start_api_server(test_ctx(), localhost())
            .await
            .expect("server should start");

        let url = format!("http://{}/nonexistent", server.session.bound_addr);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        server.shutdown();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut server = start_api_server(test_ctx(), localhost())
            .await
            .expect("server should start");

        server.shutdown();
        server.shutdown();
    }
}
