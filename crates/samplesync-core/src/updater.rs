//! Single-sample updater
//!
//! Moves one sample to a target status and appends a timestamped audit line
//! to its notes. Terminal-state refusal is not enforced here so the updater
//! stays usable for direct single-record edits; the batch path pre-filters.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::resource::{call_with_timeout, SampleResource};
use crate::status::SampleStatus;
use crate::transition::is_valid_transition;
use crate::types::{SampleId, SampleRecord, SampleUpdate};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Timestamp source for audit lines
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Applies a status change to one sample
#[derive(Clone)]
pub struct SampleUpdater {
    samples: Arc<dyn SampleResource>,
    call_timeout: Duration,
    clock: Clock,
}

impl SampleUpdater {
    /// Create updater over a sample resource
    #[must_use]
    pub fn new(samples: Arc<dyn SampleResource>, config: &SyncConfig) -> Self {
        Self {
            samples,
            call_timeout: config.call_timeout(),
            clock: Arc::new(Utc::now),
        }
    }

    /// With a fixed or simulated clock
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Move `sample_id` to `target`, appending `note` (or the status's auto
    /// note) to the audit log
    ///
    /// # Returns
    /// The record as stored after the write
    ///
    /// # Errors
    /// - `SyncError::NotFound` if the sample id is unknown
    /// - `SyncError::Transport` / `SyncError::Timeout` from either call
    pub async fn update_status(
        &self,
        sample_id: &SampleId,
        target: SampleStatus,
        note: Option<&str>,
    ) -> Result<SampleRecord, SyncError> {
        let current = call_with_timeout(
            "get_sample",
            self.call_timeout,
            self.samples.get_sample(sample_id),
        )
        .await?;

        if current.status == target {
            tracing::debug!(%sample_id, status = %target, "sample already at target status");
        } else if !is_valid_transition(current.status, target) {
            tracing::warn!(
                %sample_id,
                from = %current.status,
                to = %target,
                "unmodeled sample transition; proceeding"
            );
        }

        let line = audit_line((self.clock)(), note.unwrap_or(target.auto_note()));
        let update = SampleUpdate {
            status: target,
            notes: append_note(&current.notes, &line),
        };

        let updated = call_with_timeout(
            "update_sample",
            self.call_timeout,
            self.samples.update_sample(sample_id, update),
        )
        .await?;

        tracing::info!(%sample_id, from = %current.status, to = %target, "sample status updated");
        Ok(updated)
    }
}

impl fmt::Debug for SampleUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleUpdater")
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

/// `[<ISO-8601 UTC>] <note>`
#[must_use]
pub fn audit_line(at: DateTime<Utc>, note: &str) -> String {
    format!("[{}] {}", at.to_rfc3339_opts(SecondsFormat::Millis, true), note)
}

/// Append one line to a notes log without touching earlier content
#[must_use]
pub fn append_note(existing: &str, line: &str) -> String {
    if existing.is_empty() {
        line.to_string()
    } else if existing.ends_with('\n') {
        format!("{existing}{line}")
    } else {
        format!("{existing}\n{line}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::InMemoryLab;
    use chrono::TimeZone;

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn updater(lab: &Arc<InMemoryLab>) -> SampleUpdater {
        SampleUpdater::new(lab.clone(), &SyncConfig::new()).with_clock(fixed_clock)
    }

    #[test]
    fn audit_line_format() {
        assert_eq!(
            audit_line(fixed_clock(), "Testing started"),
            "[2024-03-01T09:30:00.000Z] Testing started"
        );
    }

    #[test]
    fn append_note_never_drops_content() {
        assert_eq!(append_note("", "b"), "b");
        assert_eq!(append_note("a", "b"), "a\nb");
        assert_eq!(append_note("a\n", "b"), "a\nb");
    }

    #[tokio::test]
    async fn update_writes_status_and_auto_note() {
        let lab = Arc::new(InMemoryLab::new());
        lab.insert_sample(SampleRecord::new("s1", SampleStatus::Received));

        let record = updater(&lab)
            .update_status(&SampleId::new("s1"), SampleStatus::Processing, None)
            .await
            .unwrap();

        assert_eq!(record.status, SampleStatus::Processing);
        assert_eq!(record.notes, "[2024-03-01T09:30:00.000Z] Testing started");
        assert_eq!(lab.sample(&SampleId::new("s1")).unwrap(), record);
    }

    #[tokio::test]
    async fn supplied_note_replaces_auto_note() {
        let lab = Arc::new(InMemoryLab::new());
        lab.insert_sample(SampleRecord::new("s1", SampleStatus::Processing));

        let record = updater(&lab)
            .update_status(&SampleId::new("s1"), SampleStatus::Failed, Some("contaminated"))
            .await
            .unwrap();

        assert!(record.notes.ends_with("] contaminated"));
    }

    #[tokio::test]
    async fn notes_are_additive() {
        let lab = Arc::new(InMemoryLab::new());
        lab.insert_sample(SampleRecord::new("s1", SampleStatus::Received).with_notes("kit scanned"));
        let updater = updater(&lab);
        let id = SampleId::new("s1");

        updater
            .update_status(&id, SampleStatus::Processing, Some("first"))
            .await
            .unwrap();
        let record = updater
            .update_status(&id, SampleStatus::Processing, Some("second"))
            .await
            .unwrap();

        let lines: Vec<_> = record.note_lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "kit scanned");
        assert!(lines[1].ends_with("first"));
        assert!(lines[2].ends_with("second"));
    }

    #[tokio::test]
    async fn terminal_sample_is_not_refused_here() {
        let lab = Arc::new(InMemoryLab::new());
        lab.insert_sample(SampleRecord::new("s1", SampleStatus::Completed));

        let record = updater(&lab)
            .update_status(&SampleId::new("s1"), SampleStatus::Processing, None)
            .await
            .unwrap();
        assert_eq!(record.status, SampleStatus::Processing);
    }

    #[tokio::test]
    async fn unknown_sample_is_not_found() {
        let lab = Arc::new(InMemoryLab::new());
        let err = updater(&lab)
            .update_status(&SampleId::new("missing"), SampleStatus::Processing, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn pass_through_fields_survive() {
        let lab = Arc::new(InMemoryLab::new());
        lab.insert_sample(
            SampleRecord::new("s1", SampleStatus::Received).with_field("sample_code", "DNA-7"),
        );

        let record = updater(&lab)
            .update_status(&SampleId::new("s1"), SampleStatus::Rejected, None)
            .await
            .unwrap();
        assert_eq!(record.extra["sample_code"], "DNA-7");
    }
}
