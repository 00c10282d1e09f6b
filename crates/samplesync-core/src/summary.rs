//! Per-order sample progress, as shown on order dashboards.

use crate::status::SampleStatus;
use crate::transition::{is_terminal, next_possible};
use crate::types::{OrderId, SampleId, SampleRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Sample counts and outstanding moves for one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSampleSummary {
    /// Order summarized
    pub order_id: OrderId,
    /// Samples resolved (duplicates included)
    pub total: usize,
    /// Count per status; statuses with no samples are absent
    pub by_status: BTreeMap<SampleStatus, usize>,
    /// Samples in a terminal state
    pub terminal: usize,
    /// Next possible states of each non-terminal sample
    pub pending_actions: BTreeMap<SampleId, BTreeSet<SampleStatus>>,
}

impl OrderSampleSummary {
    /// Summarize resolved samples
    #[must_use]
    pub fn from_samples(order_id: OrderId, samples: &[SampleRecord]) -> Self {
        let mut by_status = BTreeMap::new();
        let mut pending_actions = BTreeMap::new();
        let mut terminal = 0;

        for sample in samples {
            *by_status.entry(sample.status).or_insert(0) += 1;
            if is_terminal(sample.status) {
                terminal += 1;
            } else {
                pending_actions.insert(sample.id.clone(), next_possible(sample.status));
            }
        }

        Self {
            order_id,
            total: samples.len(),
            by_status,
            terminal,
            pending_actions,
        }
    }

    /// Every sample is terminal (and there is at least one)
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.terminal == self.total
    }
}
