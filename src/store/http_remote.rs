//! HTTP implementation of [`RemoteDataService`], plus the scripted mock
//! used across store tests.
//!
//! Every transport, status, or decode failure maps to `None` — the only
//! failure signal the store contract carries — with the cause logged here.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{broadcast, oneshot};

use crate::models::{Appointment, AppointmentUpdate, Patient, PatientUpdate};

use super::remote::RemoteDataService;

/// Capacity of the pushed-change channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;
/// Delay before re-polling the change feed after a failed request.
const FEED_RETRY_DELAY_SECS: u64 = 5;

/// JSON-over-HTTP remote data service client.
pub struct HttpRemoteService {
    base_url: String,
    client: reqwest::Client,
    changes_tx: broadcast::Sender<Appointment>,
}

impl HttpRemoteService {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            changes_tx,
        }
    }

    /// Start the long-poll loop that feeds [`RemoteDataService::changes`]
    /// receivers. Without this running, subscriptions see no pushes.
    pub fn spawn_change_feed(&self) -> ChangeFeedHandle {
        let client = self.client.clone();
        let url = format!("{}/appointments/changes", self.base_url);
        let tx = self.changes_tx.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = client.get(&url).send() => {
                        match result {
                            Ok(resp) if resp.status().is_success() => {
                                match resp.json::<Vec<Appointment>>().await {
                                    Ok(changes) => {
                                        for appointment in changes {
                                            let _ = tx.send(appointment);
                                        }
                                        continue;
                                    }
                                    Err(e) => {
                                        tracing::warn!(error = %e, "change feed returned invalid JSON");
                                    }
                                }
                            }
                            Ok(resp) => {
                                tracing::warn!(
                                    status = resp.status().as_u16(),
                                    "change feed request rejected"
                                );
                            }
                            // A timed-out long poll just means no changes
                            // in this window.
                            Err(e) if e.is_timeout() => continue,
                            Err(e) => {
                                tracing::warn!(error = %e, "change feed request failed");
                            }
                        }
                        tokio::time::sleep(Duration::from_secs(FEED_RETRY_DELAY_SECS)).await;
                    }
                }
            }
            tracing::debug!("change feed stopped");
        });

        ChangeFeedHandle {
            shutdown_tx: Some(shutdown_tx),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, op: &str, url: String) -> Option<T> {
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                self.log_transport_error(op, &e);
                return None;
            }
        };
        self.decode(op, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        op: &str,
        url: String,
        body: &B,
    ) -> Option<T> {
        let response = match self.client.post(&url).json(body).send().await {
            Ok(r) => r,
            Err(e) => {
                self.log_transport_error(op, &e);
                return None;
            }
        };
        self.decode(op, response).await
    }

    async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        op: &str,
        url: String,
        body: &B,
    ) -> Option<T> {
        let response = match self.client.patch(&url).json(body).send().await {
            Ok(r) => r,
            Err(e) => {
                self.log_transport_error(op, &e);
                return None;
            }
        };
        self.decode(op, response).await
    }

    async fn decode<T: DeserializeOwned>(&self, op: &str, response: reqwest::Response) -> Option<T> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            // Absence is an expected outcome, not a fault worth logging
            return None;
        }
        if !status.is_success() {
            tracing::warn!(op, status = status.as_u16(), "remote service rejected request");
            return None;
        }
        match response.json::<T>().await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(op, error = %e, "remote service returned invalid JSON");
                None
            }
        }
    }

    fn log_transport_error(&self, op: &str, e: &reqwest::Error) {
        if e.is_connect() {
            tracing::warn!(op, base_url = %self.base_url, "remote service unreachable");
        } else if e.is_timeout() {
            tracing::warn!(op, "remote request timed out");
        } else {
            tracing::warn!(op, error = %e, "remote request failed");
        }
    }
}

impl RemoteDataService for HttpRemoteService {
    async fn list_patients(&self) -> Option<Vec<Patient>> {
        self.get_json("list_patients", format!("{}/patients", self.base_url))
            .await
    }

    async fn fetch_patient(&self, id: &str) -> Option<Patient> {
        self.get_json(
            "fetch_patient",
            format!("{}/patients/{id}", self.base_url),
        )
        .await
    }

    async fn create_patient(&self, patient: Patient) -> Option<Patient> {
        self.post_json(
            "create_patient",
            format!("{}/patients", self.base_url),
            &patient,
        )
        .await
    }

    async fn update_patient(&self, id: &str, update: PatientUpdate) -> Option<Patient> {
        self.patch_json(
            "update_patient",
            format!("{}/patients/{id}", self.base_url),
            &update,
        )
        .await
    }

    async fn list_appointments(&self) -> Option<Vec<Appointment>> {
        self.get_json(
            "list_appointments",
            format!("{}/appointments", self.base_url),
        )
        .await
    }

    async fn fetch_appointment(&self, id: &str) -> Option<Appointment> {
        self.get_json(
            "fetch_appointment",
            format!("{}/appointments/{id}", self.base_url),
        )
        .await
    }

    async fn create_appointment(&self, appointment: Appointment) -> Option<Appointment> {
        self.post_json(
            "create_appointment",
            format!("{}/appointments", self.base_url),
            &appointment,
        )
        .await
    }

    async fn update_appointment(&self, id: &str, update: AppointmentUpdate) -> Option<Appointment> {
        self.patch_json(
            "update_appointment",
            format!("{}/appointments/{id}", self.base_url),
            &update,
        )
        .await
    }

    fn changes(&self) -> broadcast::Receiver<Appointment> {
        self.changes_tx.subscribe()
    }
}

/// Handle to a running change feed loop. Stop explicitly or by drop.
pub struct ChangeFeedHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ChangeFeedHandle {
    /// Stop the feed. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ChangeFeedHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

// ═══════════════════════════════════════════════════════════
// Mock service
// ═══════════════════════════════════════════════════════════

/// Scripted remote service for tests — in-memory collections, call
/// counters, a failure switch, and a hand-cranked push feed. Clones share
/// state, so a test can keep a probe while the store owns the service.
#[derive(Clone)]
pub struct MockRemoteService {
    state: Arc<Mutex<MockState>>,
    changes_tx: broadcast::Sender<Appointment>,
    failing: Arc<AtomicBool>,
    patient_list_calls: Arc<AtomicUsize>,
    patient_fetch_calls: Arc<AtomicUsize>,
}

struct MockState {
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
}

impl MockRemoteService {
    pub fn new() -> Self {
        Self::with_data(Vec::new(), Vec::new())
    }

    pub fn with_data(patients: Vec<Patient>, appointments: Vec<Appointment>) -> Self {
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(MockState {
                patients,
                appointments,
            })),
            changes_tx,
            failing: Arc::new(AtomicBool::new(false)),
            patient_list_calls: Arc::new(AtomicUsize::new(0)),
            patient_fetch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// When set, every operation returns `None`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Simulate a change pushed from the remote side.
    pub fn push_change(&self, appointment: Appointment) {
        // No receivers is fine — the push is simply unobserved
        let _ = self.changes_tx.send(appointment);
    }

    /// Replace the backing collections outright.
    pub fn replace_data(&self, patients: Vec<Patient>, appointments: Vec<Appointment>) {
        if let Ok(mut state) = self.state.lock() {
            state.patients = patients;
            state.appointments = appointments;
        }
    }

    pub fn patients(&self) -> Vec<Patient> {
        self.state.lock().map(|s| s.patients.clone()).unwrap_or_default()
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.state
            .lock()
            .map(|s| s.appointments.clone())
            .unwrap_or_default()
    }

    pub fn patient_list_calls(&self) -> usize {
        self.patient_list_calls.load(Ordering::SeqCst)
    }

    pub fn patient_fetch_calls(&self) -> usize {
        self.patient_fetch_calls.load(Ordering::SeqCst)
    }

    fn is_failing(&self) -> bool {
        self.failing.load(Ordering::SeqCst)
    }
}

impl Default for MockRemoteService {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteDataService for MockRemoteService {
    async fn list_patients(&self) -> Option<Vec<Patient>> {
        self.patient_list_calls.fetch_add(1, Ordering::SeqCst);
        if self.is_failing() {
            return None;
        }
        Some(self.state.lock().ok()?.patients.clone())
    }

    async fn fetch_patient(&self, id: &str) -> Option<Patient> {
        self.patient_fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.is_failing() {
            return None;
        }
        self.state
            .lock()
            .ok()?
            .patients
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    async fn create_patient(&self, patient: Patient) -> Option<Patient> {
        if self.is_failing() {
            return None;
        }
        let mut state = self.state.lock().ok()?;
        state.patients.push(patient.clone());
        Some(patient)
    }

    async fn update_patient(&self, id: &str, update: PatientUpdate) -> Option<Patient> {
        if self.is_failing() {
            return None;
        }
        let mut state = self.state.lock().ok()?;
        let patient = state.patients.iter_mut().find(|p| p.id == id)?;
        update.apply(patient);
        Some(patient.clone())
    }

    async fn list_appointments(&self) -> Option<Vec<Appointment>> {
        if self.is_failing() {
            return None;
        }
        Some(self.state.lock().ok()?.appointments.clone())
    }

    async fn fetch_appointment(&self, id: &str) -> Option<Appointment> {
        if self.is_failing() {
            return None;
        }
        self.state
            .lock()
            .ok()?
            .appointments
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    async fn create_appointment(&self, appointment: Appointment) -> Option<Appointment> {
        if self.is_failing() {
            return None;
        }
        let mut state = self.state.lock().ok()?;
        state.appointments.push(appointment.clone());
        Some(appointment)
    }

    async fn update_appointment(&self, id: &str, update: AppointmentUpdate) -> Option<Appointment> {
        if self.is_failing() {
            return None;
        }
        let mut state = self.state.lock().ok()?;
        let appointment = state.appointments.iter_mut().find(|a| a.id == id)?;
        update.apply(appointment);
        Some(appointment.clone())
    }

    fn changes(&self) -> broadcast::Receiver<Appointment> {
        self.changes_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use axum::routing::get;
    use axum::{Json, Router};

    fn make_patient(id: &str) -> Patient {
        Patient {
            id: id.to_string(),
            first_name: "Wire".to_string(),
            last_name: "Patient".to_string(),
            name: None,
            date_of_birth: "1975-02-10".to_string(),
            gender: "male".to_string(),
            pronouns: None,
            email: "wire@example.com".to_string(),
            phone: "555-0160".to_string(),
            address: "4 Route St".to_string(),
            medical_history: vec![],
            active: true,
            provider: "Dr. Test".to_string(),
        }
    }

    /// Serve `router` on an ephemeral local port, returning the base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn constructor_trims_trailing_slash() {
        let service = HttpRemoteService::new("http://localhost:9000/", 10);
        assert_eq!(service.base_url, "http://localhost:9000");
    }

    #[tokio::test]
    async fn list_patients_decodes_success_response() {
        let expected = vec![make_patient("p1"), make_patient("p2")];
        let payload = expected.clone();
        let app = Router::new().route(
            "/patients",
            get(move || {
                let payload = payload.clone();
                async move { Json(payload) }
            }),
        );
        let base = serve(app).await;

        let service = HttpRemoteService::new(&base, 5);
        let patients = service.list_patients().await.unwrap();
        assert_eq!(patients, expected);
    }

    #[tokio::test]
    async fn server_error_maps_to_none() {
        let app = Router::new().route(
            "/patients",
            get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(app).await;

        let service = HttpRemoteService::new(&base, 5);
        assert!(service.list_patients().await.is_none());
    }

    #[tokio::test]
    async fn missing_patient_maps_to_none() {
        let app = Router::new();
        let base = serve(app).await;

        let service = HttpRemoteService::new(&base, 5);
        assert!(service.fetch_patient("p404").await.is_none());
    }

    #[tokio::test]
    async fn unreachable_service_maps_to_none() {
        // Nothing listens here
        let service = HttpRemoteService::new("http://127.0.0.1:1", 1);
        assert!(service.list_patients().await.is_none());
    }

    // ── Mock behavior ─────────────────────────────────────────

    #[tokio::test]
    async fn mock_returns_seeded_data() {
        let mock = MockRemoteService::with_data(vec![make_patient("p1")], vec![]);
        let patients = mock.list_patients().await.unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(mock.patient_list_calls(), 1);
    }

    #[tokio::test]
    async fn mock_failing_switch_fails_everything() {
        let mock = MockRemoteService::with_data(vec![make_patient("p1")], vec![]);
        mock.set_failing(true);
        assert!(mock.list_patients().await.is_none());
        assert!(mock.fetch_patient("p1").await.is_none());
        assert!(mock.create_patient(make_patient("p2")).await.is_none());

        mock.set_failing(false);
        assert!(mock.fetch_patient("p1").await.is_some());
    }

    #[tokio::test]
    async fn mock_update_unknown_id_is_none() {
        let mock = MockRemoteService::new();
        let result = mock
            .update_appointment(
                "a404",
                AppointmentUpdate {
                    status: Some(AppointmentStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_none());
    }

    #[test]
    fn mock_push_without_subscribers_does_not_panic() {
        let mock = MockRemoteService::new();
        mock.push_change(Appointment {
            id: "a1".to_string(),
            patient_id: "p1".to_string(),
            time: "2026-09-02T10:00:00Z".to_string(),
            duration_minutes: 15,
            status: AppointmentStatus::Pending,
            provider: "Dr. Test".to_string(),
            reason: "Intake".to_string(),
        });
    }
}
