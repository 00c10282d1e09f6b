//! Sample transition rules
//!
//! Pure functions over the static edge map:
//!
//! ```text
//! Received   -> Processing | Rejected
//! Processing -> Completed  | Failed
//! Failed     -> Processing
//! Completed  -> (terminal)
//! Rejected   -> (terminal)
//! ```
//!
//! `is_valid_transition` is advisory. The batch path enforces only the
//! terminal and no-op rules.

use crate::status::SampleStatus;
use std::collections::BTreeSet;

/// States reachable in one step from `current`
#[must_use]
pub fn next_possible(current: SampleStatus) -> BTreeSet<SampleStatus> {
    use SampleStatus::*;
    let targets: &[SampleStatus] = match current {
        Received => &[Processing, Rejected],
        Processing => &[Completed, Failed],
        Failed => &[Processing],
        Completed | Rejected => &[],
    };
    targets.iter().copied().collect()
}

/// Whether the edge map models `current -> target`
#[inline]
#[must_use]
pub fn is_valid_transition(current: SampleStatus, target: SampleStatus) -> bool {
    next_possible(current).contains(&target)
}

/// Terminal states have no outbound edges
#[inline]
#[must_use]
pub fn is_terminal(status: SampleStatus) -> bool {
    matches!(status, SampleStatus::Completed | SampleStatus::Rejected)
}
