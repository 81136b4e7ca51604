use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedChart";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/MedChart/ on all platforms
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("MedChart")
}

/// Get the SQLite database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("medchart.db")
}

/// Get the directory backing the file-based local store
pub fn storage_dir() -> PathBuf {
    app_data_dir().join("storage")
}

/// Default log filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    "medchart=info,tower_http=info".to_string()
}

/// Runtime configuration for the service, resolved from environment
/// variables with local-service defaults.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub transcription_url: String,
    pub transcription_timeout_secs: u64,
    pub summarization_url: String,
    pub summarization_model: String,
    pub summarization_timeout_secs: u64,
    /// Remote data service base URL; the remote store is only wired up
    /// when this is set.
    pub remote_url: Option<String>,
    pub remote_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: env_or("MEDCHART_BIND_ADDR", "127.0.0.1:8787")
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8787))),
            transcription_url: env_or("MEDCHART_TRANSCRIBE_URL", "http://localhost:8800"),
            transcription_timeout_secs: 120,
            summarization_url: env_or("MEDCHART_SUMMARY_URL", "http://localhost:11434"),
            summarization_model: env_or("MEDCHART_SUMMARY_MODEL", "medgemma:4b"),
            summarization_timeout_secs: 300,
            remote_url: std::env::var("MEDCHART_REMOTE_URL").ok(),
            remote_timeout_secs: 30,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
