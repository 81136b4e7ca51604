use serde::{Deserialize, Serialize};

/// Clinical encounter with SOAP note fields. Persisted in SQLite on the
/// service side; the transcription endpoint fills `transcript` and
/// `generated_summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub patient_id: String,
    pub subjective: Option<String>,
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
    pub vitals: Option<Vitals>,
    pub medications: Vec<String>,
    pub audio_url: Option<String>,
    pub transcript: Option<String>,
    pub generated_summary: Option<String>,
    /// RFC 3339.
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>, // "120/80"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<i32>,
}
