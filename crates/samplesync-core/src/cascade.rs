//! Cascade resolver
//!
//! Walks Order -> SampleKit(s) -> Sample(s). Kit lookups for one order fan
//! out with bounded concurrency; a kit whose sample lookup fails is skipped
//! without affecting its siblings. Only a failure to list the order's kits
//! fails the resolution as a whole.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::resource::{call_with_timeout, SampleKitResource, SampleResource};
use crate::types::{OrderId, SampleKit, SampleRecord};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;

/// Resolves every sample reachable from an order
#[derive(Clone)]
pub struct CascadeResolver {
    kits: Arc<dyn SampleKitResource>,
    samples: Arc<dyn SampleResource>,
    call_timeout: Duration,
    max_concurrency: usize,
}

impl CascadeResolver {
    /// Create resolver over the kit and sample resources
    #[must_use]
    pub fn new(
        kits: Arc<dyn SampleKitResource>,
        samples: Arc<dyn SampleResource>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            kits,
            samples,
            call_timeout: config.call_timeout(),
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Samples of every kit of `order_id`, concatenated in kit order
    ///
    /// Duplicates are kept: a sample listed under two kits appears twice.
    ///
    /// # Errors
    /// `SyncError::ResolutionFailure` if the order's kits cannot be listed.
    #[tracing::instrument(skip_all, fields(order_id = %order_id))]
    pub async fn resolve_samples(&self, order_id: &OrderId) -> Result<Vec<SampleRecord>, SyncError> {
        let kits = call_with_timeout(
            "kits_by_order",
            self.call_timeout,
            self.kits.kits_by_order(order_id),
        )
        .await
        .map_err(|e| SyncError::ResolutionFailure {
            order_id: order_id.to_string(),
            reason: e.to_string(),
        })?;

        if kits.is_empty() {
            tracing::debug!("order has no sample kits yet");
            return Ok(Vec::new());
        }

        let per_kit: Vec<Vec<SampleRecord>> = stream::iter(&kits)
            .map(|kit| self.samples_for_kit(kit))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let samples: Vec<SampleRecord> = per_kit.into_iter().flatten().collect();
        tracing::debug!(kits = kits.len(), samples = samples.len(), "cascade resolved");
        Ok(samples)
    }

    async fn samples_for_kit(&self, kit: &SampleKit) -> Vec<SampleRecord> {
        let mut samples = match call_with_timeout(
            "samples_by_kit",
            self.call_timeout,
            self.samples.samples_by_kit(&kit.id),
        )
        .await
        {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!(kit_id = %kit.id, error = %e, "sample lookup failed; skipping kit");
                return Vec::new();
            }
        };

        // Either pointer direction proves ownership.
        if let Some(forward) = &kit.samples_id {
            if !samples.iter().any(|s| &s.id == forward) {
                match call_with_timeout(
                    "get_sample",
                    self.call_timeout,
                    self.samples.get_sample(forward),
                )
                .await
                {
                    Ok(sample) => {
                        tracing::debug!(
                            kit_id = %kit.id,
                            sample_id = %forward,
                            "sample reachable only through kit pointer"
                        );
                        samples.push(sample);
                    }
                    Err(e) => tracing::warn!(
                        kit_id = %kit.id,
                        sample_id = %forward,
                        error = %e,
                        "kit points at a sample that could not be fetched"
                    ),
                }
            }
        }

        samples
    }
}

impl std::fmt::Debug for CascadeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeResolver")
            .field("call_timeout", &self.call_timeout)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}
