//! Subcommand bodies, kept free of argument parsing so they can be tested.

use anyhow::{Context, Result};
use samplesync_core::{
    is_terminal, next_possible, AppointmentId, AppointmentSampleOrchestrator, AppointmentStatus,
    GateDecision, InMemoryLab, LabSnapshot, OrderId, OrderSampleSummary, SampleStatus,
    SyncConfig, SyncOutcome, SyncReport,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

pub(crate) fn load_lab(path: &Path) -> Result<InMemoryLab> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading lab snapshot {}", path.display()))?;
    let snapshot: LabSnapshot = serde_json::from_str(&text)
        .with_context(|| format!("parsing lab snapshot {}", path.display()))?;
    Ok(InMemoryLab::from_snapshot(snapshot))
}

pub(crate) fn save_lab(path: &Path, lab: &InMemoryLab) -> Result<()> {
    let text = serde_json::to_string_pretty(&lab.snapshot())?;
    std::fs::write(path, text).with_context(|| format!("writing lab snapshot {}", path.display()))
}

fn orchestrator(config: &SyncConfig, lab: &Arc<InMemoryLab>) -> AppointmentSampleOrchestrator {
    AppointmentSampleOrchestrator::new(config.clone(), lab.clone(), lab.clone(), lab.clone())
}

/// `SyncReport` plus its classification, as printed
#[derive(Debug, Serialize)]
pub(crate) struct SyncView {
    outcome: SyncOutcome,
    #[serde(flatten)]
    report: SyncReport,
}

impl From<SyncReport> for SyncView {
    fn from(report: SyncReport) -> Self {
        Self {
            outcome: report.outcome(),
            report,
        }
    }
}

pub(crate) async fn sync(
    config: &SyncConfig,
    lab_path: &Path,
    appointment_id: &str,
    status: AppointmentStatus,
    write: bool,
) -> Result<SyncReport> {
    let lab = Arc::new(load_lab(lab_path)?);
    let appointment = lab
        .appointment(&AppointmentId::new(appointment_id))
        .with_context(|| format!("appointment {appointment_id} not found"))?;

    let report = orchestrator(config, &lab)
        .update_appointment_with_samples(&appointment, status)
        .await?;

    if report.outcome() == SyncOutcome::PartiallySynced {
        tracing::warn!(
            appointment_id,
            "appointment updated; some samples did not follow and need attention"
        );
    }
    if write {
        save_lab(lab_path, &lab)?;
    }
    Ok(report)
}

pub(crate) async fn check(
    config: &SyncConfig,
    lab_path: &Path,
    appointment_id: &str,
    status: AppointmentStatus,
) -> Result<GateDecision> {
    let lab = Arc::new(load_lab(lab_path)?);
    let appointment = lab
        .appointment(&AppointmentId::new(appointment_id))
        .with_context(|| format!("appointment {appointment_id} not found"))?;

    Ok(orchestrator(config, &lab)
        .gate()
        .can_transition_appointment(&appointment, status)
        .await)
}

pub(crate) async fn summary(
    config: &SyncConfig,
    lab_path: &Path,
    order_id: &str,
) -> Result<OrderSampleSummary> {
    let lab = Arc::new(load_lab(lab_path)?);
    let summary = orchestrator(config, &lab)
        .summarize_order(&OrderId::new(order_id))
        .await?;
    Ok(summary)
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct TransitionsView {
    from: SampleStatus,
    terminal: bool,
    next: BTreeSet<SampleStatus>,
}

pub(crate) fn transitions(status: SampleStatus) -> TransitionsView {
    TransitionsView {
        from: status,
        terminal: is_terminal(status),
        next: next_possible(status),
    }
}
