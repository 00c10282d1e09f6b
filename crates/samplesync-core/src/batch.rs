//! Batch synchronizer
//!
//! Applies one target status across many samples. Terminal samples and
//! samples already at the target are skipped before any call is made, and a
//! sample listed twice is updated once. Every other sample is updated
//! independently and its outcome recorded in its own slot. A failing sample
//! never stops its siblings.

use crate::config::SyncConfig;
use crate::error::{ErrorKind, SyncError};
use crate::status::SampleStatus;
use crate::transition::is_terminal;
use crate::types::{SampleId, SampleRecord};
use crate::updater::SampleUpdater;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Why a sample was left untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Current status has no outbound edges
    Terminal,
    /// Current status already equals the target
    AlreadyAtTarget,
    /// Same sample appeared earlier in the batch
    Duplicate,
}

/// Sample left untouched by a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSample {
    /// Sample id
    pub sample_id: SampleId,
    /// Status it was found in
    pub status: SampleStatus,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// One failed item of a batch
///
/// `sample_id` is `None` only for the synthetic error recorded when the
/// cascade could not enumerate samples at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFailure {
    /// Failing sample, if the failure is per-sample
    pub sample_id: Option<SampleId>,
    /// Error classification
    pub kind: ErrorKind,
    /// Error message
    pub error: String,
}

impl SampleFailure {
    /// Failure of one sample's update
    #[must_use]
    pub fn for_sample(sample_id: SampleId, error: &SyncError) -> Self {
        Self {
            sample_id: Some(sample_id),
            kind: error.kind(),
            error: error.to_string(),
        }
    }

    /// Failure to enumerate the batch
    #[must_use]
    pub fn resolution(error: &SyncError) -> Self {
        Self {
            sample_id: None,
            kind: ErrorKind::ResolutionFailure,
            error: error.to_string(),
        }
    }
}

/// Aggregate outcome of one batch
///
/// Never all-or-nothing: `updated` holds what was written even when `errors`
/// is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// `errors.is_empty()`
    pub success: bool,
    /// Records as stored after their update
    pub updated: Vec<SampleRecord>,
    /// Samples not attempted
    pub skipped: Vec<SkippedSample>,
    /// Per-item failures
    pub errors: Vec<SampleFailure>,
}

impl BatchResult {
    /// Assemble a result; `success` follows from `errors`
    #[must_use]
    pub fn new(
        updated: Vec<SampleRecord>,
        skipped: Vec<SkippedSample>,
        errors: Vec<SampleFailure>,
    ) -> Self {
        Self {
            success: errors.is_empty(),
            updated,
            skipped,
            errors,
        }
    }

    /// Nothing to do
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    /// Batch that could not start because samples could not be resolved
    #[must_use]
    pub fn resolution_failure(error: &SyncError) -> Self {
        Self::new(Vec::new(), Vec::new(), vec![SampleFailure::resolution(error)])
    }

    /// Ids of updated samples, in batch order
    pub fn updated_ids(&self) -> impl Iterator<Item = &SampleId> {
        self.updated.iter().map(|r| &r.id)
    }
}

/// Applies a status to every sample of a batch
#[derive(Debug, Clone)]
pub struct BatchSynchronizer {
    updater: SampleUpdater,
    max_concurrency: usize,
}

impl BatchSynchronizer {
    /// Create synchronizer driving `updater`
    #[must_use]
    pub fn new(updater: SampleUpdater, config: &SyncConfig) -> Self {
        Self {
            updater,
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// With a fixed or simulated clock for audit lines
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.updater = self.updater.with_clock(clock);
        self
    }

    /// Underlying single-sample updater
    #[inline]
    #[must_use]
    pub fn updater(&self) -> &SampleUpdater {
        &self.updater
    }

    /// Move every eligible sample to `target`, noting `context_note`
    ///
    /// Samples are skipped (not attempted, not errors) when terminal,
    /// already at `target`, or repeated. Each id is written at most once per
    /// batch. Completes only once every attempt has finished.
    pub async fn apply_status_to_order(
        &self,
        samples: &[SampleRecord],
        target: SampleStatus,
        context_note: &str,
    ) -> BatchResult {
        let mut skipped = Vec::new();
        let mut pending = Vec::new();
        let mut seen = HashSet::new();

        for sample in samples {
            let reason = if is_terminal(sample.status) {
                Some(SkipReason::Terminal)
            } else if sample.status == target {
                Some(SkipReason::AlreadyAtTarget)
            } else if !seen.insert(&sample.id) {
                Some(SkipReason::Duplicate)
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    tracing::debug!(sample_id = %sample.id, status = %sample.status, ?reason, "skipping sample");
                    skipped.push(SkippedSample {
                        sample_id: sample.id.clone(),
                        status: sample.status,
                        reason,
                    });
                }
                None => pending.push(&sample.id),
            }
        }

        let outcomes: Vec<(SampleId, Result<SampleRecord, SyncError>)> = stream::iter(pending)
            .map(|sample_id| async move {
                let outcome = self
                    .updater
                    .update_status(sample_id, target, Some(context_note))
                    .await;
                (sample_id.clone(), outcome)
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut updated = Vec::new();
        let mut errors = Vec::new();
        for (sample_id, outcome) in outcomes {
            match outcome {
                Ok(record) => updated.push(record),
                Err(e) => {
                    tracing::warn!(%sample_id, error = %e, "sample update failed");
                    errors.push(SampleFailure::for_sample(sample_id, &e));
                }
            }
        }

        tracing::info!(
            target_status = %target,
            updated = updated.len(),
            skipped = skipped.len(),
            failed = errors.len(),
            "batch applied"
        );
        BatchResult::new(updated, skipped, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLab;
    use std::sync::Arc;

    fn synchronizer(lab: &Arc<InMemoryLab>) -> BatchSynchronizer {
        let config = SyncConfig::new();
        BatchSynchronizer::new(SampleUpdater::new(lab.clone(), &config), &config)
    }

    fn seed(lab: &InMemoryLab, samples: &[SampleRecord]) {
        for sample in samples {
            lab.insert_sample(sample.clone());
        }
    }

    #[tokio::test]
    async fn terminal_samples_are_skipped_for_every_target() {
        for current in [SampleStatus::Completed, SampleStatus::Rejected] {
            for target in SampleStatus::ALL {
                let lab = Arc::new(InMemoryLab::new());
                let samples = vec![SampleRecord::new("s1", current)];
                seed(&lab, &samples);

                let result = synchronizer(&lab)
                    .apply_status_to_order(&samples, target, "ctx")
                    .await;

                assert!(result.success);
                assert!(result.updated.is_empty(), "{current} -> {target}");
                assert_eq!(result.skipped.len(), 1);
                assert_eq!(lab.sample(&SampleId::new("s1")).unwrap().status, current);
            }
        }
    }

    #[tokio::test]
    async fn same_status_is_a_no_op() {
        let lab = Arc::new(InMemoryLab::new());
        let samples = vec![SampleRecord::new("s1", SampleStatus::Processing).with_notes("orig")];
        seed(&lab, &samples);

        let result = synchronizer(&lab)
            .apply_status_to_order(&samples, SampleStatus::Processing, "ctx")
            .await;

        assert!(result.updated.is_empty());
        assert_eq!(result.skipped[0].reason, SkipReason::AlreadyAtTarget);
        assert_eq!(lab.sample(&SampleId::new("s1")).unwrap().notes, "orig");
    }

    #[tokio::test]
    async fn unknown_sample_lands_in_error_slot() {
        let lab = Arc::new(InMemoryLab::new());
        lab.insert_sample(SampleRecord::new("s1", SampleStatus::Received));
        let samples = vec![
            SampleRecord::new("s1", SampleStatus::Received),
            SampleRecord::new("ghost", SampleStatus::Received),
        ];

        let result = synchronizer(&lab)
            .apply_status_to_order(&samples, SampleStatus::Processing, "ctx")
            .await;

        assert!(!result.success);
        assert_eq!(result.updated_ids().collect::<Vec<_>>(), [&SampleId::new("s1")]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].sample_id, Some(SampleId::new("ghost")));
        assert_eq!(result.errors[0].kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn context_note_is_written() {
        let lab = Arc::new(InMemoryLab::new());
        let samples = vec![SampleRecord::new("s1", SampleStatus::Received)];
        seed(&lab, &samples);

        let result = synchronizer(&lab)
            .apply_status_to_order(
                &samples,
                SampleStatus::Processing,
                "auto-updated from appointment status: Testing",
            )
            .await;

        assert!(result.updated[0]
            .notes
            .ends_with("] auto-updated from appointment status: Testing"));
    }

    #[test]
    fn resolution_failure_shape() {
        let err = SyncError::ResolutionFailure {
            order_id: "o1".into(),
            reason: "unreachable".into(),
        };
        let result = BatchResult::resolution_failure(&err);
        assert!(!result.success);
        assert!(result.updated.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].sample_id, None);
        assert_eq!(result.errors[0].kind, ErrorKind::ResolutionFailure);
    }
}
