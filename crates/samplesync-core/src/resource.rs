//! Collaborator seams
//!
//! The engine reaches samples, kits and appointments only through these
//! traits. Implement them over whatever transport the application uses; the
//! engine bounds every call with the configured timeout.

use crate::error::SyncError;
use crate::status::AppointmentStatus;
use crate::types::{AppointmentId, KitId, OrderId, SampleId, SampleKit, SampleRecord, SampleUpdate};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Sample resource (get, update, list by kit)
#[async_trait]
pub trait SampleResource: Send + Sync {
    /// Fetch one sample
    ///
    /// # Errors
    /// `SyncError::NotFound` for an unknown id, `Transport` on call failure.
    async fn get_sample(&self, id: &SampleId) -> Result<SampleRecord, SyncError>;

    /// Persist a status/notes change and return the stored record
    async fn update_sample(
        &self,
        id: &SampleId,
        update: SampleUpdate,
    ) -> Result<SampleRecord, SyncError>;

    /// Samples whose back pointer names `kit_id`
    async fn samples_by_kit(&self, kit_id: &KitId) -> Result<Vec<SampleRecord>, SyncError>;
}

/// Sample kit resource
#[async_trait]
pub trait SampleKitResource: Send + Sync {
    /// Kits belonging to an order; empty when the order has none yet
    async fn kits_by_order(&self, order_id: &OrderId) -> Result<Vec<SampleKit>, SyncError>;
}

/// Commits an appointment status change in the scheduling system
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentCommitter: Send + Sync {
    /// Durably record the new status
    ///
    /// # Errors
    /// Any error aborts the orchestration before sample work starts.
    async fn commit(
        &self,
        appointment_id: &AppointmentId,
        new_status: AppointmentStatus,
    ) -> Result<(), SyncError>;
}

/// Await a collaborator call, failing with `SyncError::Timeout` past `limit`
pub(crate) async fn call_with_timeout<T, F>(
    operation: &'static str,
    limit: Duration,
    call: F,
) -> Result<T, SyncError>
where
    F: Future<Output = Result<T, SyncError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(operation, timeout_ms, "collaborator call timed out");
            Err(SyncError::Timeout {
                operation,
                timeout_ms,
            })
        }
    }
}
