//! Synchronous patient/appointment store persisted as JSON blobs.
//!
//! Collections live in memory and are written back to the storage backend
//! in full on every mutation — no diffing, no debouncing. That is
//! acceptable here because the collections are small and single-user.
//! Absent ids are never errors: lookups return `None`, updates no-op.

use crate::models::{Appointment, AppointmentUpdate, Patient, PatientUpdate};
use crate::seed;

use super::storage::StorageBackend;
use super::StoreError;

/// Storage key for the patient collection.
pub const STORAGE_KEY_PATIENTS: &str = "emr_patients";
/// Storage key for the appointment collection.
pub const STORAGE_KEY_APPOINTMENTS: &str = "emr_appointments";

pub struct LocalDataStore<B: StorageBackend> {
    backend: B,
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
}

impl<B: StorageBackend> LocalDataStore<B> {
    /// Load both collections from the backend. A key that has never been
    /// written is seeded from the demo arrays and persisted; a present key
    /// (even `[]`) is taken as-is.
    pub fn open(backend: B) -> Result<Self, StoreError> {
        let patients = match backend.read(STORAGE_KEY_PATIENTS)? {
            Some(json) => serde_json::from_str(&json)?,
            None => {
                let seeded = seed::seed_patients();
                backend.write(STORAGE_KEY_PATIENTS, &serde_json::to_string(&seeded)?)?;
                seeded
            }
        };

        let appointments = match backend.read(STORAGE_KEY_APPOINTMENTS)? {
            Some(json) => serde_json::from_str(&json)?,
            None => {
                let seeded = seed::seed_appointments();
                backend.write(STORAGE_KEY_APPOINTMENTS, &serde_json::to_string(&seeded)?)?;
                seeded
            }
        };

        Ok(Self {
            backend,
            patients,
            appointments,
        })
    }

    // ── Patients ──────────────────────────────────────────────

    /// Defensive copy of the patient list. No I/O.
    pub fn patients(&self) -> Vec<Patient> {
        self.patients.clone()
    }

    /// Linear scan by id. `None` when absent.
    pub fn patient_by_id(&self, id: &str) -> Option<Patient> {
        self.patients.iter().find(|p| p.id == id).cloned()
    }

    /// Append and persist the whole collection. Id uniqueness is the
    /// caller's concern (pre-generate via [`generate_patient_id`]).
    ///
    /// [`generate_patient_id`]: Self::generate_patient_id
    pub fn add_patient(&mut self, patient: Patient) -> Result<(), StoreError> {
        self.patients.push(patient);
        self.persist_patients()
    }

    /// Shallow-merge onto the matching record and persist. Silently no-ops
    /// (without persisting) when the id is absent.
    pub fn update_patient(&mut self, id: &str, update: PatientUpdate) -> Result<(), StoreError> {
        match self.patients.iter_mut().find(|p| p.id == id) {
            Some(patient) => {
                update.apply(patient);
                self.persist_patients()
            }
            None => Ok(()),
        }
    }

    /// Next id in the `p<n>` sequence: max existing numeric suffix + 1.
    /// Ids that do not parse as prefix+integer contribute nothing, so an
    /// empty collection yields `p1`.
    pub fn generate_patient_id(&self) -> String {
        format!("p{}", next_suffix(self.patients.iter().map(|p| p.id.as_str())))
    }

    // ── Appointments ──────────────────────────────────────────

    /// Defensive copy of the appointment list. No I/O.
    pub fn appointments(&self) -> Vec<Appointment> {
        self.appointments.clone()
    }

    /// Linear scan by id. `None` when absent.
    pub fn appointment_by_id(&self, id: &str) -> Option<Appointment> {
        self.appointments.iter().find(|a| a.id == id).cloned()
    }

    /// Append and persist the whole collection.
    pub fn add_appointment(&mut self, appointment: Appointment) -> Result<(), StoreError> {
        self.appointments.push(appointment);
        self.persist_appointments()
    }

    /// Shallow-merge onto the matching record and persist. Silently no-ops
    /// (without persisting) when the id is absent.
    pub fn update_appointment(
        &mut self,
        id: &str,
        update: AppointmentUpdate,
    ) -> Result<(), StoreError> {
        match self.appointments.iter_mut().find(|a| a.id == id) {
            Some(appointment) => {
                update.apply(appointment);
                self.persist_appointments()
            }
            None => Ok(()),
        }
    }

    /// Remove by id. Persists afterward even when nothing matched.
    pub fn delete_appointment(&mut self, id: &str) -> Result<(), StoreError> {
        self.appointments.retain(|a| a.id != id);
        self.persist_appointments()
    }

    /// Next id in the `a<n>` sequence. Same rules as
    /// [`generate_patient_id`](Self::generate_patient_id).
    pub fn generate_appointment_id(&self) -> String {
        format!(
            "a{}",
            next_suffix(self.appointments.iter().map(|a| a.id.as_str()))
        )
    }

    // ── Persistence ───────────────────────────────────────────

    fn persist_patients(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.patients)?;
        self.backend.write(STORAGE_KEY_PATIENTS, &json)
    }

    fn persist_appointments(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.appointments)?;
        self.backend.write(STORAGE_KEY_APPOINTMENTS, &json)
    }
}

/// Max numeric suffix of `<letter><n>` ids, 0 floor, plus one.
fn next_suffix<'a>(ids: impl Iterator<Item = &'a str>) -> u32 {
    ids.filter_map(|id| id.get(1..))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1
}
