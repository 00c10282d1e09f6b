//! Appointment-sample orchestrator
//!
//! Entry point for appointment status changes:
//! 1. Commit the appointment change (always first; errors propagate)
//! 2. Derive the implied sample status
//! 3. Resolve the order's samples and apply the status as a batch
//!
//! The appointment commit is never rolled back. Scheduling and sample
//! tracking are separate systems of record; a failed or partial cascade is
//! reported, not undone.

use crate::batch::{BatchResult, BatchSynchronizer};
use crate::cascade::CascadeResolver;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::gate::TransitionGate;
use crate::resource::{call_with_timeout, AppointmentCommitter, SampleKitResource, SampleResource};
use crate::status::{sample_status_for, AppointmentStatus, SampleStatus};
use crate::summary::OrderSampleSummary;
use crate::types::{Appointment, AppointmentId, OrderId};
use crate::updater::SampleUpdater;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How far samples followed an appointment change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The new appointment status implies no sample change
    NoSampleAction,
    /// Every eligible sample now matches
    FullySynced,
    /// Some samples (or the cascade itself) failed
    PartiallySynced,
}

/// Result of `update_appointment_with_samples`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Appointment that changed
    pub appointment_id: AppointmentId,
    /// Always `true` on a returned report: the commit happened
    pub appointment_updated: bool,
    /// Status committed
    pub new_status: AppointmentStatus,
    /// Sample status the cascade targeted, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_status: Option<SampleStatus>,
    /// Cascade result, absent when no sample action applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples_result: Option<BatchResult>,
}

impl SyncReport {
    fn committed(appointment_id: AppointmentId, new_status: AppointmentStatus) -> Self {
        Self {
            appointment_id,
            appointment_updated: true,
            new_status,
            sample_status: None,
            samples_result: None,
        }
    }

    /// Classify the report
    #[must_use]
    pub fn outcome(&self) -> SyncOutcome {
        match &self.samples_result {
            None => SyncOutcome::NoSampleAction,
            Some(result) if result.success => SyncOutcome::FullySynced,
            Some(_) => SyncOutcome::PartiallySynced,
        }
    }
}

/// Keeps samples in step with appointment status changes
#[derive(Clone)]
pub struct AppointmentSampleOrchestrator {
    config: SyncConfig,
    committer: Arc<dyn AppointmentCommitter>,
    resolver: CascadeResolver,
    batch: BatchSynchronizer,
}

impl AppointmentSampleOrchestrator {
    /// Wire the orchestrator to its collaborators
    #[must_use]
    pub fn new(
        config: SyncConfig,
        samples: Arc<dyn SampleResource>,
        kits: Arc<dyn SampleKitResource>,
        committer: Arc<dyn AppointmentCommitter>,
    ) -> Self {
        let resolver = CascadeResolver::new(kits, samples.clone(), &config);
        let batch = BatchSynchronizer::new(SampleUpdater::new(samples, &config), &config);
        Self {
            config,
            committer,
            resolver,
            batch,
        }
    }

    /// With a fixed or simulated clock for audit lines
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.batch = self.batch.with_clock(clock);
        self
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Cascade resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &CascadeResolver {
        &self.resolver
    }

    /// Batch synchronizer
    #[inline]
    #[must_use]
    pub fn batch(&self) -> &BatchSynchronizer {
        &self.batch
    }

    /// Pre-flight gate sharing this orchestrator's resolver
    #[must_use]
    pub fn gate(&self) -> TransitionGate {
        TransitionGate::new(self.resolver.clone())
    }

    /// Sample progress for an order
    ///
    /// # Errors
    /// `SyncError::ResolutionFailure` if the order's kits cannot be listed.
    pub async fn summarize_order(&self, order_id: &OrderId) -> Result<OrderSampleSummary, SyncError> {
        let samples = self.resolver.resolve_samples(order_id).await?;
        Ok(OrderSampleSummary::from_samples(order_id.clone(), &samples))
    }

    /// Commit `new_status` for `appointment`, then cascade to its samples
    ///
    /// # Returns
    /// A report whose `outcome()` tells "no sample action", "fully synced"
    /// and "partially synced" apart. Per-sample and resolution failures are
    /// inside the report, never an `Err`.
    ///
    /// # Errors
    /// Only the appointment commit's own failure, before any sample call.
    #[tracing::instrument(
        skip_all,
        fields(appointment_id = %appointment.id, new_status = %new_status)
    )]
    pub async fn update_appointment_with_samples(
        &self,
        appointment: &Appointment,
        new_status: AppointmentStatus,
    ) -> Result<SyncReport, SyncError> {
        if let Err(e) = call_with_timeout(
            "commit_appointment",
            self.config.call_timeout(),
            self.committer.commit(&appointment.id, new_status),
        )
        .await
        {
            tracing::error!(error = %e, "appointment commit failed");
            return Err(e);
        }
        tracing::info!("appointment status committed");

        let mut report = SyncReport::committed(appointment.id.clone(), new_status);

        let Some(target) = sample_status_for(new_status) else {
            tracing::debug!("no sample action for appointment status");
            return Ok(report);
        };
        report.sample_status = Some(target);

        let Some(order_id) = &appointment.order_id else {
            tracing::warn!(sample_status = %target, "appointment has no order; samples not synced");
            return Ok(report);
        };

        let result = match self.resolver.resolve_samples(order_id).await {
            Ok(samples) => {
                let note = format!("{}: {}", self.config.note_context_prefix, new_status.label());
                self.batch.apply_status_to_order(&samples, target, &note).await
            }
            Err(e) => {
                tracing::error!(%order_id, error = %e, "sample cascade could not resolve order");
                BatchResult::resolution_failure(&e)
            }
        };

        if !result.success {
            tracing::warn!(
                failed = result.errors.len(),
                "appointment committed but samples only partially synced"
            );
        }
        report.samples_result = Some(result);
        Ok(report)
    }
}

impl std::fmt::Debug for AppointmentSampleOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppointmentSampleOrchestrator")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .field("batch", &self.batch)
            .finish_non_exhaustive()
    }
}
