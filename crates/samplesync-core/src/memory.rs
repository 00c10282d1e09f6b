//! In-memory lab backend
//!
//! Implements every collaborator seam over concurrent maps. Backs the CLI and
//! tests; loads from and saves to a `LabSnapshot`.

use crate::error::{ResourceKind, SyncError};
use crate::resource::{AppointmentCommitter, SampleKitResource, SampleResource};
use crate::status::AppointmentStatus;
use crate::types::{
    Appointment, AppointmentId, KitId, OrderId, SampleId, SampleKit, SampleRecord, SampleUpdate,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Serializable lab state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabSnapshot {
    /// Appointments
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    /// Sample kits
    #[serde(default)]
    pub kits: Vec<SampleKit>,
    /// Samples
    #[serde(default)]
    pub samples: Vec<SampleRecord>,
}

/// Concurrent in-memory lab
#[derive(Debug, Default)]
pub struct InMemoryLab {
    appointments: DashMap<AppointmentId, Appointment>,
    kits: DashMap<KitId, SampleKit>,
    samples: DashMap<SampleId, SampleRecord>,
}

impl InMemoryLab {
    /// Create empty lab
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: LabSnapshot) -> Self {
        let lab = Self::new();
        for appointment in snapshot.appointments {
            lab.insert_appointment(appointment);
        }
        for kit in snapshot.kits {
            lab.insert_kit(kit);
        }
        for sample in snapshot.samples {
            lab.insert_sample(sample);
        }
        lab
    }

    /// Current state, each collection sorted by id
    #[must_use]
    pub fn snapshot(&self) -> LabSnapshot {
        let mut appointments: Vec<_> = self.appointments.iter().map(|e| e.value().clone()).collect();
        appointments.sort_by(|a, b| a.id.cmp(&b.id));
        let mut kits: Vec<_> = self.kits.iter().map(|e| e.value().clone()).collect();
        kits.sort_by(|a, b| a.id.cmp(&b.id));
        let mut samples: Vec<_> = self.samples.iter().map(|e| e.value().clone()).collect();
        samples.sort_by(|a, b| a.id.cmp(&b.id));

        LabSnapshot {
            appointments,
            kits,
            samples,
        }
    }

    /// Insert or replace an appointment
    pub fn insert_appointment(&self, appointment: Appointment) {
        self.appointments.insert(appointment.id.clone(), appointment);
    }

    /// Insert or replace a kit
    pub fn insert_kit(&self, kit: SampleKit) {
        self.kits.insert(kit.id.clone(), kit);
    }

    /// Insert or replace a sample
    pub fn insert_sample(&self, sample: SampleRecord) {
        self.samples.insert(sample.id.clone(), sample);
    }

    /// Look up an appointment
    #[must_use]
    pub fn appointment(&self, id: &AppointmentId) -> Option<Appointment> {
        self.appointments.get(id).map(|e| e.value().clone())
    }

    /// Look up a sample
    #[must_use]
    pub fn sample(&self, id: &SampleId) -> Option<SampleRecord> {
        self.samples.get(id).map(|e| e.value().clone())
    }
}

#[async_trait]
impl SampleResource for InMemoryLab {
    async fn get_sample(&self, id: &SampleId) -> Result<SampleRecord, SyncError> {
        self.sample(id)
            .ok_or_else(|| SyncError::not_found(ResourceKind::Sample, id))
    }

    async fn update_sample(
        &self,
        id: &SampleId,
        update: SampleUpdate,
    ) -> Result<SampleRecord, SyncError> {
        let mut entry = self
            .samples
            .get_mut(id)
            .ok_or_else(|| SyncError::not_found(ResourceKind::Sample, id))?;
        entry.status = update.status;
        entry.notes = update.notes;
        Ok(entry.value().clone())
    }

    async fn samples_by_kit(&self, kit_id: &KitId) -> Result<Vec<SampleRecord>, SyncError> {
        let mut samples: Vec<_> = self
            .samples
            .iter()
            .filter(|e| e.value().sample_kits_id.as_ref() == Some(kit_id))
            .map(|e| e.value().clone())
            .collect();
        samples.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(samples)
    }
}

#[async_trait]
impl SampleKitResource for InMemoryLab {
    async fn kits_by_order(&self, order_id: &OrderId) -> Result<Vec<SampleKit>, SyncError> {
        let mut kits: Vec<_> = self
            .kits
            .iter()
            .filter(|e| &e.value().order_id == order_id)
            .map(|e| e.value().clone())
            .collect();
        kits.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(kits)
    }
}

#[async_trait]
impl AppointmentCommitter for InMemoryLab {
    async fn commit(
        &self,
        appointment_id: &AppointmentId,
        new_status: AppointmentStatus,
    ) -> Result<(), SyncError> {
        let mut entry = self
            .appointments
            .get_mut(appointment_id)
            .ok_or_else(|| SyncError::not_found(ResourceKind::Appointment, appointment_id))?;
        entry.status = new_status;
        Ok(())
    }
}
