use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use medchart::api::{start_api_server, ApiContext};
use medchart::config::{self, ServiceConfig};
use medchart::db::{open_database, DatabaseError};
use medchart::store::{FsStorage, HttpRemoteService, LocalDataStore, RemoteStore};
use medchart::transcribe::{HttpSummarizationClient, HttpTranscriptionClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    medchart::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    std::fs::create_dir_all(config::app_data_dir())?;

    let conn = open_database(&config::database_path())?;
    seed_visits_if_empty(&conn)?;
    let db = Arc::new(Mutex::new(conn));

    // Local store over the on-disk backend; seeds itself on first run
    let local = LocalDataStore::open(FsStorage::new(config::storage_dir())?)?;
    tracing::info!(
        patients = local.patients().len(),
        appointments = local.appointments().len(),
        "local store ready"
    );

    let cfg = ServiceConfig::default();

    // Remote mirror is optional — only wired when a service URL is set
    let _remote = match &cfg.remote_url {
        Some(url) => {
            let service = HttpRemoteService::new(url, cfg.remote_timeout_secs);
            let feed = service.spawn_change_feed();
            let remote = RemoteStore::new(service);
            remote.initialize().await;
            let subscription = remote.subscribe_to_changes(|appointment| {
                tracing::info!(id = %appointment.id, "appointment change received");
            });
            tracing::info!(url = %url, "remote store initialized");
            Some((remote, feed, subscription))
        }
        None => None,
    };

    let transcriber = Arc::new(HttpTranscriptionClient::new(
        &cfg.transcription_url,
        cfg.transcription_timeout_secs,
    ));
    let summarizer = Arc::new(HttpSummarizationClient::new(
        &cfg.summarization_url,
        &cfg.summarization_model,
        cfg.summarization_timeout_secs,
    ));

    let ctx = ApiContext::new(db, transcriber, summarizer);
    let mut server = start_api_server(ctx, cfg.bind_addr).await?;
    tracing::info!(addr = %server.session.bound_addr, "ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.shutdown();

    Ok(())
}

fn seed_visits_if_empty(conn: &Connection) -> Result<(), DatabaseError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM visits", [], |row| row.get(0))?;
    if count == 0 {
        for visit in medchart::seed::seed_visits() {
            medchart::db::repository::insert_visit(conn, &visit)?;
        }
        tracing::info!("seeded demo visits");
    }
    Ok(())
}
