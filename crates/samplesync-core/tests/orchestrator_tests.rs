//! End-to-end orchestration: commit first, then cascade.

use samplesync_core::{
    sample_status_for, AppointmentId, AppointmentStatus, ErrorKind, SampleId, SampleStatus,
    SyncConfig, SyncError, SyncOutcome,
};
use samplesync_test_utils::{
    appointment, ids, setup_orchestrator, two_kit_lab, FaultyLab, RecordingCommitter, APPOINTMENT,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn testing_moves_samples_to_processing() {
    let lab = Arc::new(FaultyLab::new(two_kit_lab()));
    let committer = Arc::new(RecordingCommitter::new());
    let orchestrator = setup_orchestrator(&lab, &committer, SyncConfig::new());

    let report = orchestrator
        .update_appointment_with_samples(&appointment(), AppointmentStatus::Testing)
        .await
        .unwrap();

    assert!(report.appointment_updated);
    assert_eq!(report.outcome(), SyncOutcome::FullySynced);
    assert_eq!(report.sample_status, Some(SampleStatus::Processing));
    assert_eq!(
        committer.commits(),
        [(AppointmentId::new(APPOINTMENT), AppointmentStatus::Testing)]
    );

    let result = report.samples_result.unwrap();
    assert_eq!(ids(result.updated_ids()), ["s1", "s3"]);
    let s1 = lab.lab().sample(&SampleId::new("s1")).unwrap();
    assert_eq!(
        s1.notes,
        "[2024-03-01T09:30:00.000Z] auto-updated from appointment status: Testing"
    );
    // pass-through fields untouched
    let s3 = lab.lab().sample(&SampleId::new("s3")).unwrap();
    assert_eq!(s3.extra["sample_code"], "DNA-0003");
}

#[tokio::test]
async fn unmapped_statuses_make_no_sample_calls() {
    for status in AppointmentStatus::ALL {
        if sample_status_for(status).is_some() {
            continue;
        }
        let lab = Arc::new(FaultyLab::new(two_kit_lab()));
        let committer = Arc::new(RecordingCommitter::new());
        let orchestrator = setup_orchestrator(&lab, &committer, SyncConfig::new());

        let report = orchestrator
            .update_appointment_with_samples(&appointment(), status)
            .await
            .unwrap();

        assert!(report.appointment_updated, "{status}");
        assert!(report.samples_result.is_none(), "{status}");
        assert_eq!(report.outcome(), SyncOutcome::NoSampleAction);
        assert_eq!(lab.calls.total(), 0, "{status}");
        assert_eq!(committer.commits().len(), 1);
    }
}

#[tokio::test]
async fn commit_failure_propagates_before_cascade() {
    let lab = Arc::new(FaultyLab::new(two_kit_lab()));
    let committer = Arc::new(RecordingCommitter::failing(
        APPOINTMENT,
        SyncError::CommitFailed("slot already closed".into()),
    ));
    let orchestrator = setup_orchestrator(&lab, &committer, SyncConfig::new());

    let err = orchestrator
        .update_appointment_with_samples(&appointment(), AppointmentStatus::Testing)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CommitFailed);
    assert_eq!(lab.calls.total(), 0);
    assert_eq!(lab.status_of("s1"), SampleStatus::Received);
}

#[tokio::test]
async fn resolution_failure_is_reported_not_raised() {
    let lab = Arc::new(FaultyLab::new(two_kit_lab()).fail_kit_listing());
    let committer = Arc::new(RecordingCommitter::new());
    let orchestrator = setup_orchestrator(&lab, &committer, SyncConfig::new());

    let report = orchestrator
        .update_appointment_with_samples(&appointment(), AppointmentStatus::Completed)
        .await
        .unwrap();

    // the commit stands
    assert!(report.appointment_updated);
    assert_eq!(committer.commits().len(), 1);
    assert_eq!(report.outcome(), SyncOutcome::PartiallySynced);

    let result = report.samples_result.unwrap();
    assert!(!result.success);
    assert!(result.updated.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].sample_id, None);
    assert_eq!(result.errors[0].kind, ErrorKind::ResolutionFailure);
}

#[tokio::test]
async fn partial_sync_keeps_successful_updates() {
    let lab = Arc::new(FaultyLab::new(two_kit_lab()).fail_update("s3"));
    let committer = Arc::new(RecordingCommitter::new());
    let orchestrator = setup_orchestrator(&lab, &committer, SyncConfig::new());

    let report = orchestrator
        .update_appointment_with_samples(&appointment(), AppointmentStatus::Testing)
        .await
        .unwrap();

    assert_eq!(report.outcome(), SyncOutcome::PartiallySynced);
    let result = report.samples_result.unwrap();
    assert_eq!(ids(result.updated_ids()), ["s1"]);
    assert_eq!(result.errors[0].sample_id, Some(SampleId::new("s3")));
    assert_eq!(lab.status_of("s1"), SampleStatus::Processing);
}

#[tokio::test]
async fn repeated_change_is_idempotent() {
    let lab = Arc::new(FaultyLab::new(two_kit_lab()));
    let committer = Arc::new(RecordingCommitter::new());
    let orchestrator = setup_orchestrator(&lab, &committer, SyncConfig::new());

    orchestrator
        .update_appointment_with_samples(&appointment(), AppointmentStatus::Testing)
        .await
        .unwrap();
    let notes_before = lab.lab().sample(&SampleId::new("s1")).unwrap().notes;

    let report = orchestrator
        .update_appointment_with_samples(&appointment(), AppointmentStatus::Testing)
        .await
        .unwrap();

    let result = report.samples_result.unwrap();
    assert!(result.updated.is_empty());
    assert_eq!(result.skipped.len(), 3);
    assert_eq!(lab.lab().sample(&SampleId::new("s1")).unwrap().notes, notes_before);
}

#[tokio::test]
async fn summary_reflects_cascade() {
    let lab = Arc::new(FaultyLab::new(two_kit_lab()));
    let committer = Arc::new(RecordingCommitter::new());
    let orchestrator = setup_orchestrator(&lab, &committer, SyncConfig::new());

    orchestrator
        .update_appointment_with_samples(&appointment(), AppointmentStatus::Completed)
        .await
        .unwrap();

    let summary = orchestrator
        .summarize_order(&samplesync_core::OrderId::new("o1"))
        .await
        .unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.by_status[&SampleStatus::Completed], 3);
    assert!(summary.is_finished());
}

#[tokio::test]
async fn gate_is_advisory_only() {
    let lab = Arc::new(FaultyLab::new(samplesync_core::InMemoryLab::new()));
    let committer = Arc::new(RecordingCommitter::new());
    let orchestrator = setup_orchestrator(&lab, &committer, SyncConfig::new());

    let decision = orchestrator
        .gate()
        .can_transition_appointment(&appointment(), AppointmentStatus::Testing)
        .await;
    assert!(!decision.can_update);

    // the orchestrator does not consult the gate
    let report = orchestrator
        .update_appointment_with_samples(&appointment(), AppointmentStatus::Testing)
        .await
        .unwrap();
    assert_eq!(report.outcome(), SyncOutcome::FullySynced);
    assert_eq!(committer.commits().len(), 1);
}

#[tokio::test]
async fn zero_timeout_config_does_not_time_out_every_call() {
    let lab = Arc::new(FaultyLab::new(two_kit_lab()).with_update_delay(Duration::from_millis(20)));
    let committer = Arc::new(RecordingCommitter::new());
    let config = SyncConfig::new().with_call_timeout(Duration::ZERO);
    let orchestrator = setup_orchestrator(&lab, &committer, config);

    let report = orchestrator
        .update_appointment_with_samples(&appointment(), AppointmentStatus::Testing)
        .await
        .unwrap();

    assert_eq!(report.outcome(), SyncOutcome::FullySynced);
    assert_eq!(lab.status_of("s1"), SampleStatus::Processing);
    assert_eq!(lab.status_of("s3"), SampleStatus::Processing);
}
