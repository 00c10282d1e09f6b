//! Testing utilities for SampleSync workspace
//!
//! Shared fixtures, a fault-injecting lab and a recording committer.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use samplesync_core::{
    Appointment, AppointmentCommitter, AppointmentId, AppointmentSampleOrchestrator,
    AppointmentStatus, InMemoryLab, KitId, OrderId, SampleId, SampleKit, SampleKitResource,
    SampleRecord, SampleResource, SampleStatus, SampleUpdate, SyncConfig, SyncError,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const ORDER: &str = "o1";
pub const APPOINTMENT: &str = "a1";

/// 2024-03-01T09:30:00Z
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

/// Order `o1` with kit A `[s1: Received, s2: Completed]` and kit B
/// `[s3: Received]`, plus appointment `a1` (SampleReceived) on that order.
pub fn two_kit_lab() -> InMemoryLab {
    let lab = InMemoryLab::new();
    lab.insert_appointment(
        Appointment::new(APPOINTMENT, AppointmentStatus::SampleReceived).with_order(ORDER),
    );
    lab.insert_kit(SampleKit::new("kA", ORDER));
    lab.insert_kit(SampleKit::new("kB", ORDER).with_sample("s3"));
    lab.insert_sample(SampleRecord::new("s1", SampleStatus::Received).in_kit("kA"));
    lab.insert_sample(SampleRecord::new("s2", SampleStatus::Completed).in_kit("kA"));
    lab.insert_sample(
        SampleRecord::new("s3", SampleStatus::Received)
            .in_kit("kB")
            .with_field("sample_code", "DNA-0003"),
    );
    lab
}

/// Order `o1` where `s1` is owned by kit A through its back-pointer and by
/// kit B through B's forward pointer, so it resolves twice.
pub fn shared_sample_lab() -> InMemoryLab {
    let lab = InMemoryLab::new();
    lab.insert_kit(SampleKit::new("kA", ORDER));
    lab.insert_kit(SampleKit::new("kB", ORDER).with_sample("s1"));
    lab.insert_sample(
        SampleRecord::new("s1", SampleStatus::Received)
            .in_kit("kA")
            .with_notes("orig"),
    );
    lab
}

pub fn appointment() -> Appointment {
    Appointment::new(APPOINTMENT, AppointmentStatus::SampleReceived).with_order(ORDER)
}

pub fn ids<'a>(ids: impl IntoIterator<Item = &'a SampleId>) -> Vec<&'a str> {
    ids.into_iter().map(SampleId::as_str).collect()
}

/// Per-operation call counts
#[derive(Debug, Default)]
pub struct CallCounts {
    pub kits_by_order: AtomicUsize,
    pub samples_by_kit: AtomicUsize,
    pub get_sample: AtomicUsize,
    pub update_sample: AtomicUsize,
}

impl CallCounts {
    pub fn sample_calls(&self) -> usize {
        self.samples_by_kit.load(Ordering::SeqCst)
            + self.get_sample.load(Ordering::SeqCst)
            + self.update_sample.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.kits_by_order.load(Ordering::SeqCst) + self.sample_calls()
    }
}

/// `InMemoryLab` wrapper that fails or stalls chosen calls and counts traffic
#[derive(Debug, Default)]
pub struct FaultyLab {
    inner: InMemoryLab,
    fail_kit_listing: bool,
    failing_kits: HashSet<KitId>,
    failing_updates: HashSet<SampleId>,
    stalled_updates: HashSet<SampleId>,
    update_delay: Option<Duration>,
    pub calls: CallCounts,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    kit_order: Mutex<Vec<KitId>>,
}

impl FaultyLab {
    pub fn new(inner: InMemoryLab) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// `kits_by_order` fails for every order
    pub fn fail_kit_listing(mut self) -> Self {
        self.fail_kit_listing = true;
        self
    }

    /// `samples_by_kit` fails for this kit
    pub fn fail_kit(mut self, kit: &str) -> Self {
        self.failing_kits.insert(KitId::new(kit));
        self
    }

    /// `update_sample` fails for this sample
    pub fn fail_update(mut self, sample: &str) -> Self {
        self.failing_updates.insert(SampleId::new(sample));
        self
    }

    /// `update_sample` never answers for this sample
    pub fn stall_update(mut self, sample: &str) -> Self {
        self.stalled_updates.insert(SampleId::new(sample));
        self
    }

    /// Every `update_sample` sleeps first
    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = Some(delay);
        self
    }

    pub fn lab(&self) -> &InMemoryLab {
        &self.inner
    }

    pub fn status_of(&self, sample: &str) -> SampleStatus {
        self.inner
            .sample(&SampleId::new(sample))
            .map(|s| s.status)
            .unwrap()
    }

    /// Highest number of concurrent `update_sample` calls seen
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Kits in the order their sample lookups started
    pub fn kit_lookup_order(&self) -> Vec<KitId> {
        self.kit_order.lock().clone()
    }
}

#[async_trait]
impl SampleResource for FaultyLab {
    async fn get_sample(&self, id: &SampleId) -> Result<SampleRecord, SyncError> {
        self.calls.get_sample.fetch_add(1, Ordering::SeqCst);
        self.inner.get_sample(id).await
    }

    async fn update_sample(
        &self,
        id: &SampleId,
        update: SampleUpdate,
    ) -> Result<SampleRecord, SyncError> {
        self.calls.update_sample.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.stalled_updates.contains(id) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(delay) = self.update_delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.failing_updates.contains(id) {
            Err(SyncError::transport(format!("503 while updating {id}")))
        } else {
            self.inner.update_sample(id, update).await
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn samples_by_kit(&self, kit_id: &KitId) -> Result<Vec<SampleRecord>, SyncError> {
        self.calls.samples_by_kit.fetch_add(1, Ordering::SeqCst);
        self.kit_order.lock().push(kit_id.clone());
        if self.failing_kits.contains(kit_id) {
            return Err(SyncError::transport(format!("connection reset fetching kit {kit_id}")));
        }
        self.inner.samples_by_kit(kit_id).await
    }
}

#[async_trait]
impl SampleKitResource for FaultyLab {
    async fn kits_by_order(&self, order_id: &OrderId) -> Result<Vec<SampleKit>, SyncError> {
        self.calls.kits_by_order.fetch_add(1, Ordering::SeqCst);
        if self.fail_kit_listing {
            return Err(SyncError::transport("order service unreachable"));
        }
        self.inner.kits_by_order(order_id).await
    }
}

/// Committer that records every call and can be told to fail
#[derive(Debug, Default)]
pub struct RecordingCommitter {
    commits: Mutex<Vec<(AppointmentId, AppointmentStatus)>>,
    failures: Mutex<HashMap<AppointmentId, SyncError>>,
}

impl RecordingCommitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(appointment: &str, error: SyncError) -> Self {
        let committer = Self::new();
        committer
            .failures
            .lock()
            .insert(AppointmentId::new(appointment), error);
        committer
    }

    pub fn commits(&self) -> Vec<(AppointmentId, AppointmentStatus)> {
        self.commits.lock().clone()
    }
}

#[async_trait]
impl AppointmentCommitter for RecordingCommitter {
    async fn commit(
        &self,
        appointment_id: &AppointmentId,
        new_status: AppointmentStatus,
    ) -> Result<(), SyncError> {
        if let Some(error) = self.failures.lock().get(appointment_id) {
            return Err(error.clone());
        }
        self.commits.lock().push((appointment_id.clone(), new_status));
        Ok(())
    }
}

/// Orchestrator over a faulty lab with a fixed clock
pub fn setup_orchestrator(
    lab: &Arc<FaultyLab>,
    committer: &Arc<RecordingCommitter>,
    config: SyncConfig,
) -> AppointmentSampleOrchestrator {
    AppointmentSampleOrchestrator::new(config, lab.clone(), lab.clone(), committer.clone())
        .with_clock(fixed_now)
}
