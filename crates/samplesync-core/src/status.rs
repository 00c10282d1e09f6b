//! Status taxonomy
//!
//! The closed set of sample lifecycle states, the appointment workflow states
//! that drive them, and the partial mapping between the two.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a lab sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    /// Physically received by the lab (initial state)
    Received,
    /// Under test
    Processing,
    /// Testing finished (terminal)
    Completed,
    /// Testing failed; may be retried
    Failed,
    /// Sample unusable (terminal)
    Rejected,
}

impl SampleStatus {
    /// Every sample status, in lifecycle order
    pub const ALL: [SampleStatus; 5] = [
        Self::Received,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Rejected,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        }
    }

    /// Human-readable label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Received => "Received",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Rejected => "Rejected",
        }
    }

    /// Audit note written when a sample moves into this state
    #[inline]
    #[must_use]
    pub fn auto_note(&self) -> &'static str {
        match self {
            Self::Received => "Sample received",
            Self::Processing => "Testing started",
            Self::Completed => "Testing completed",
            Self::Failed => "Testing failed",
            Self::Rejected => "Sample rejected",
        }
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseStatusError::sample(s))
    }
}

/// Workflow state of an appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked, awaiting confirmation
    Pending,
    /// Confirmed by staff
    Confirmed,
    /// Collection kit returned and sample logged
    SampleReceived,
    /// Lab testing underway
    Testing,
    /// Results issued
    Completed,
    /// Cancelled by customer or staff
    Cancelled,
}

impl AppointmentStatus {
    /// Every appointment status, in workflow order
    pub const ALL: [AppointmentStatus; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::SampleReceived,
        Self::Testing,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::SampleReceived => "sample_received",
            Self::Testing => "testing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::SampleReceived => "Sample Received",
            Self::Testing => "Testing",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseStatusError::appointment(s))
    }
}

/// Sample status implied by an appointment status, if any
///
/// Statuses outside `SampleReceived`, `Testing` and `Completed` imply no
/// sample action.
#[inline]
#[must_use]
pub fn sample_status_for(status: AppointmentStatus) -> Option<SampleStatus> {
    match status {
        AppointmentStatus::SampleReceived => Some(SampleStatus::Received),
        AppointmentStatus::Testing => Some(SampleStatus::Processing),
        AppointmentStatus::Completed => Some(SampleStatus::Completed),
        AppointmentStatus::Pending | AppointmentStatus::Confirmed | AppointmentStatus::Cancelled => {
            None
        }
    }
}

/// Unrecognized status text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {domain} status: {value:?}")]
pub struct ParseStatusError {
    domain: &'static str,
    value: String,
}

impl ParseStatusError {
    fn sample(value: &str) -> Self {
        Self {
            domain: "sample",
            value: value.to_string(),
        }
    }

    fn appointment(value: &str) -> Self {
        Self {
            domain: "appointment",
            value: value.to_string(),
        }
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_three_statuses() {
        assert_eq!(
            sample_status_for(AppointmentStatus::SampleReceived),
            Some(SampleStatus::Received)
        );
        assert_eq!(
            sample_status_for(AppointmentStatus::Testing),
            Some(SampleStatus::Processing)
        );
        assert_eq!(
            sample_status_for(AppointmentStatus::Completed),
            Some(SampleStatus::Completed)
        );
    }

    #[test]
    fn taxonomy_leaves_other_statuses_unmapped() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
        ] {
            assert_eq!(sample_status_for(status), None, "{status}");
        }
    }

    #[test]
    fn parse_accepts_labels_and_wire_names() {
        assert_eq!(
            "Sample Received".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::SampleReceived
        );
        assert_eq!(
            "sample-received".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::SampleReceived
        );
        assert_eq!(
            " PROCESSING ".parse::<SampleStatus>().unwrap(),
            SampleStatus::Processing
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "shipped".parse::<SampleStatus>().unwrap_err();
        assert!(err.to_string().contains("unknown sample status"));
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&AppointmentStatus::SampleReceived).unwrap();
        assert_eq!(json, "\"sample_received\"");
        let status: SampleStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(status, SampleStatus::Rejected);
    }

    #[test]
    fn auto_notes() {
        assert_eq!(SampleStatus::Processing.auto_note(), "Testing started");
        assert_eq!(SampleStatus::Rejected.auto_note(), "Sample rejected");
    }
}
