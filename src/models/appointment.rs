use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    /// Scheduled start, RFC 3339.
    pub time: String,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub provider: String,
    pub reason: String,
}

/// Partial appointment for shallow-merge updates.
///
/// Status writes are applied as-is; there is no transition guard between
/// the booked/pending/cancelled/completed states.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AppointmentUpdate {
    pub fn apply(self, appointment: &mut Appointment) {
        if let Some(v) = self.patient_id {
            appointment.patient_id = v;
        }
        if let Some(v) = self.time {
            appointment.time = v;
        }
        if let Some(v) = self.duration_minutes {
            appointment.duration_minutes = v;
        }
        if let Some(v) = self.status {
            appointment.status = v;
        }
        if let Some(v) = self.provider {
            appointment.provider = v;
        }
        if let Some(v) = self.reason {
            appointment.reason = v;
        }
    }
}
