use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::ExternalApiError;

/// Speech-to-text over raw audio bytes.
pub trait TranscriptionClient: Send + Sync {
    fn transcribe(&self, audio: &[u8]) -> Result<String, ExternalApiError>;
}

/// Text generation with a caller-supplied system prompt.
pub trait SummarizationClient: Send + Sync {
    fn summarize(&self, transcript: &str, system: &str) -> Result<String, ExternalApiError>;
}

// ═══════════════════════════════════════════════════════════
// HTTP implementations
// ═══════════════════════════════════════════════════════════

/// HTTP client for the transcription service.
pub struct HttpTranscriptionClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpTranscriptionClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }
}

/// Response body from the transcription service
#[derive(Deserialize)]
struct TranscribeApiResponse {
    text: String,
}

impl TranscriptionClient for HttpTranscriptionClient {
    fn transcribe(&self, audio: &[u8]) -> Result<String, ExternalApiError> {
        let url = format!("{}/transcribe", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExternalApiError::Unreachable(self.base_url.clone())
                } else if e.is_timeout() {
                    ExternalApiError::Timeout(self.timeout_secs)
                } else {
                    ExternalApiError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExternalApiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranscribeApiResponse = response
            .json()
            .map_err(|e| ExternalApiError::ResponseParsing(e.to_string()))?;

        Ok(parsed.text)
    }
}

/// HTTP client for the summarization service (Ollama-style generate API).
pub struct HttpSummarizationClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpSummarizationClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }
}

/// Request body for /api/generate
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

/// Response body from /api/generate
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl SummarizationClient for HttpSummarizationClient {
    fn summarize(&self, transcript: &str, system: &str) -> Result<String, ExternalApiError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt: transcript,
            system,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExternalApiError::Unreachable(self.base_url.clone())
                } else if e.is_timeout() {
                    ExternalApiError::Timeout(self.timeout_secs)
                } else {
                    ExternalApiError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExternalApiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ExternalApiError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

// ═══════════════════════════════════════════════════════════
// Mock clients
// ═══════════════════════════════════════════════════════════

/// Mock transcription client for testing — returns a configurable
/// transcript, or fails when scripted to.
#[derive(Clone)]
pub struct MockTranscriptionClient {
    transcript: String,
    fail: bool,
    audio_sizes: Arc<Mutex<Vec<usize>>>,
}

impl MockTranscriptionClient {
    pub fn new(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            fail: false,
            audio_sizes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        let mut mock = Self::new("");
        mock.fail = true;
        mock
    }

    /// Byte lengths of every audio payload received.
    pub fn audio_sizes(&self) -> Vec<usize> {
        self.audio_sizes.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl TranscriptionClient for MockTranscriptionClient {
    fn transcribe(&self, audio: &[u8]) -> Result<String, ExternalApiError> {
        if let Ok(mut sizes) = self.audio_sizes.lock() {
            sizes.push(audio.len());
        }
        if self.fail {
            return Err(ExternalApiError::Unreachable("mock://transcribe".to_string()));
        }
        Ok(self.transcript.clone())
    }
}

/// Mock summarization client for testing — records the system prompts it
/// was called with.
#[derive(Clone)]
pub struct MockSummarizationClient {
    summary: String,
    fail: bool,
    system_prompts: Arc<Mutex<Vec<String>>>,
}

impl MockSummarizationClient {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            fail: false,
            system_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        let mut mock = Self::new("");
        mock.fail = true;
        mock
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.system_prompts
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl SummarizationClient for MockSummarizationClient {
    fn summarize(&self, _transcript: &str, system: &str) -> Result<String, ExternalApiError> {
        if let Ok(mut prompts) = self.system_prompts.lock() {
            prompts.push(system.to_string());
        }
        if self.fail {
            return Err(ExternalApiError::Unreachable("mock://summarize".to_string()));
        }
        Ok(self.summary.clone())
    }
}
