use serde::{Deserialize, Serialize};

use super::enums::{PrescriptionStatus, RefillStatus};

/// E-prescribing draft. Demo-only: rendered from seed data, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub status: PrescriptionStatus,
}

/// Pharmacy refill request. Demo-only: rendered from seed data, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefillRequest {
    pub id: String,
    pub patient_id: String,
    pub medication: String,
    /// Request timestamp, RFC 3339.
    pub requested_at: String,
    pub status: RefillStatus,
}
