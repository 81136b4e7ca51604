//! Async patient/appointment store backed by a remote data service.
//!
//! The service is a trait seam: HTTP in production
//! ([`HttpRemoteService`](super::http_remote::HttpRemoteService)), scripted
//! in tests. Failure is signalled the way the wrapped service signals it —
//! `None` — with no structured reason; the store performs no retries, no
//! timeout handling, and no backoff of its own.
//!
//! The in-memory cache is read-through with no eviction and no TTL. Its
//! only mutation points are miss-fills, mutation reconciles, pushed
//! changes, and [`RemoteStore::refresh`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, oneshot, RwLock};

use crate::models::{Appointment, AppointmentUpdate, Patient, PatientUpdate};

/// Remote CRUD surface. `None` means the operation failed; the caller gets
/// no further detail (implementations log the cause).
pub trait RemoteDataService: Send + Sync + 'static {
    fn list_patients(&self) -> impl Future<Output = Option<Vec<Patient>>> + Send;
    fn fetch_patient(&self, id: &str) -> impl Future<Output = Option<Patient>> + Send;
    fn create_patient(&self, patient: Patient) -> impl Future<Output = Option<Patient>> + Send;
    fn update_patient(
        &self,
        id: &str,
        update: PatientUpdate,
    ) -> impl Future<Output = Option<Patient>> + Send;

    fn list_appointments(&self) -> impl Future<Output = Option<Vec<Appointment>>> + Send;
    fn fetch_appointment(&self, id: &str) -> impl Future<Output = Option<Appointment>> + Send;
    fn create_appointment(
        &self,
        appointment: Appointment,
    ) -> impl Future<Output = Option<Appointment>> + Send;
    fn update_appointment(
        &self,
        id: &str,
        update: AppointmentUpdate,
    ) -> impl Future<Output = Option<Appointment>> + Send;

    /// Feed of appointment changes pushed by the remote side. Each call
    /// returns a fresh receiver that sees changes from this point on.
    fn changes(&self) -> broadcast::Receiver<Appointment>;
}

#[derive(Debug, Default)]
struct RemoteCache {
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
}

impl RemoteCache {
    fn upsert_appointment(&mut self, appointment: Appointment) {
        match self
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment.id)
        {
            Some(slot) => *slot = appointment,
            None => self.appointments.push(appointment),
        }
    }
}

/// Async store over a [`RemoteDataService`] with a read-through cache and
/// push-based synchronization. Construct one per deployment and share by
/// cloning; there is no process-wide singleton.
pub struct RemoteStore<S: RemoteDataService> {
    service: Arc<S>,
    cache: Arc<RwLock<RemoteCache>>,
    initialized: Arc<AtomicBool>,
}

impl<S: RemoteDataService> Clone for RemoteStore<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            cache: Arc::clone(&self.cache),
            initialized: Arc::clone(&self.initialized),
        }
    }
}

impl<S: RemoteDataService> RemoteStore<S> {
    pub fn new(service: S) -> Self {
        Self {
            service: Arc::new(service),
            cache: Arc::new(RwLock::new(RemoteCache::default())),
            initialized: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load both collections once. Later calls no-op. The flag is only set
    /// after the load completes, so two callers racing here may both load;
    /// last write wins.
    pub async fn initialize(&self) {
        if self.initialized.load(Ordering::SeqCst) {
            return;
        }

        if let Some(patients) = self.service.list_patients().await {
            self.cache.write().await.patients = patients;
        }
        if let Some(appointments) = self.service.list_appointments().await {
            self.cache.write().await.appointments = appointments;
        }

        self.initialized.store(true, Ordering::SeqCst);
    }

    // ── Patients ──────────────────────────────────────────────

    /// Defensive copy of the cached patient list.
    pub async fn patients(&self) -> Vec<Patient> {
        self.cache.read().await.patients.clone()
    }

    /// Cache first; on a miss, fetch from the service and fill the cache.
    /// Entries never expire.
    pub async fn patient_by_id(&self, id: &str) -> Option<Patient> {
        {
            let cache = self.cache.read().await;
            if let Some(patient) = cache.patients.iter().find(|p| p.id == id) {
                return Some(patient.clone());
            }
        }

        let fetched = self.service.fetch_patient(id).await?;
        self.cache.write().await.patients.push(fetched.clone());
        Some(fetched)
    }

    /// Delegate to the service; on success append to the cache. On failure
    /// the cache is untouched and the caller gets `None`.
    pub async fn add_patient(&self, patient: Patient) -> Option<Patient> {
        let created = self.service.create_patient(patient).await?;
        self.cache.write().await.patients.push(created.clone());
        Some(created)
    }

    /// Delegate to the service; on success replace the cached record in
    /// place when present (a record not in the cache is not appended). On
    /// failure the cache is untouched and the caller gets `None`.
    pub async fn update_patient(&self, id: &str, update: PatientUpdate) -> Option<Patient> {
        let updated = self.service.update_patient(id, update).await?;
        let mut cache = self.cache.write().await;
        if let Some(slot) = cache.patients.iter_mut().find(|p| p.id == id) {
            *slot = updated.clone();
        }
        Some(updated)
    }

    // ── Appointments ──────────────────────────────────────────

    /// Defensive copy of the cached appointment list.
    pub async fn appointments(&self) -> Vec<Appointment> {
        self.cache.read().await.appointments.clone()
    }

    /// Same read-through behavior as [`patient_by_id`](Self::patient_by_id).
    pub async fn appointment_by_id(&self, id: &str) -> Option<Appointment> {
        {
            let cache = self.cache.read().await;
            if let Some(appointment) = cache.appointments.iter().find(|a| a.id == id) {
                return Some(appointment.clone());
            }
        }

        let fetched = self.service.fetch_appointment(id).await?;
        self.cache.write().await.appointments.push(fetched.clone());
        Some(fetched)
    }

    pub async fn add_appointment(&self, appointment: Appointment) -> Option<Appointment> {
        let created = self.service.create_appointment(appointment).await?;
        self.cache.write().await.appointments.push(created.clone());
        Some(created)
    }

    pub async fn update_appointment(
        &self,
        id: &str,
        update: AppointmentUpdate,
    ) -> Option<Appointment> {
        let updated = self.service.update_appointment(id, update).await?;
        let mut cache = self.cache.write().await;
        if let Some(slot) = cache.appointments.iter_mut().find(|a| a.id == id) {
            *slot = updated.clone();
        }
        Some(updated)
    }

    // ── Push subscription ─────────────────────────────────────

    /// Consume the service's change feed: each pushed appointment is
    /// upserted into the cache by id, then `on_update` runs.
    ///
    /// The returned handle owns the pump task. Dropping it (or calling
    /// [`SubscriptionHandle::unsubscribe`]) stops delivery.
    pub fn subscribe_to_changes<F>(&self, on_update: F) -> SubscriptionHandle
    where
        F: Fn(&Appointment) + Send + 'static,
    {
        let mut rx = self.service.changes();
        let cache = Arc::clone(&self.cache);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    msg = rx.recv() => match msg {
                        Ok(appointment) => {
                            cache.write().await.upsert_appointment(appointment.clone());
                            on_update(&appointment);
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "change feed lagged, some updates dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!("change subscription stopped");
        });

        SubscriptionHandle {
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Unconditionally reload both collections, overwriting the cache; no
    /// merge with concurrent local edits (last reload wins). A collection
    /// whose reload fails is left as-is.
    pub async fn refresh(&self) {
        if let Some(patients) = self.service.list_patients().await {
            self.cache.write().await.patients = patients;
        }
        if let Some(appointments) = self.service.list_appointments().await {
            self.cache.write().await.appointments = appointments;
        }
    }
}

/// Handle to an active change subscription. Disposal is explicit:
/// `unsubscribe()` or drop.
pub struct SubscriptionHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl SubscriptionHandle {
    /// Stop the subscription. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
