//! Upload Flow Integration Tests
//!
//! Batch upload through store-file and create-record against a scripted
//! backend: status map invariants, per-item failure isolation and pre-flight
//! validation.

mod common;

use common::{blobs, request, ScriptedBackend};
use std::sync::Arc;
use tokio::sync::Semaphore;
use vibration_diag::types::{UploadItem, UploadState};
use vibration_diag::upload::{UploadOrchestrator, ValidationError};
use vibration_diag::{AnalysisStatus, DiagnoseSession, RecordStage, SessionError, WorkQueue};

#[tokio::test]
async fn three_files_all_succeed_and_analyze_ok() {
    let backend = Arc::new(ScriptedBackend::new());
    let session = DiagnoseSession::new(backend.clone());
    session.select_batch(blobs(&["a.csv", "b.csv", "c.csv"])).await;

    let outcome = session.process(&request("M-101")).await.unwrap();
    assert!(outcome.all_succeeded());
    assert_eq!(outcome.record_ids.len(), 3);
    assert!(session.all_completed().await);
    assert!(!session.has_errors().await);

    let results = session.analyze().await;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.status() == AnalysisStatus::Ok));

    let stages = session.stages().await;
    assert_eq!(stages.len(), 3);
    assert!(stages.iter().all(|s| matches!(
        s.stage,
        RecordStage::Analyzed {
            status: AnalysisStatus::Ok,
            ..
        }
    )));
}

#[tokio::test]
async fn storage_failure_is_isolated_to_its_item() {
    let backend = Arc::new(ScriptedBackend::new().fail_store("bad.csv"));
    let session = DiagnoseSession::new(backend.clone());
    session.select_batch(blobs(&["bad.csv", "good.csv"])).await;

    let outcome = session.process(&request("M-101")).await.unwrap();
    assert!(!outcome.all_succeeded());
    assert_eq!(outcome.record_ids.len(), 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, 0);
    assert!(outcome.failures[0].1.contains("storage quota exceeded"));

    // the failing item never reached record creation, the next one did
    assert_eq!(backend.calls_starting("record:"), vec!["record:good.csv"]);
    assert!(session.has_errors().await);
    assert!(!session.all_completed().await);

    session.analyze().await;
    assert_eq!(backend.calls_starting("analyze:"), vec!["analyze:r1"]);

    let stages = session.stages().await;
    assert!(matches!(stages[0].stage, RecordStage::UploadFailed { .. }));
    assert!(matches!(stages[1].stage, RecordStage::Analyzed { .. }));
}

#[tokio::test]
async fn record_creation_failure_marks_item_error() {
    let backend = Arc::new(ScriptedBackend::new().fail_record("b.csv"));
    let orchestrator = UploadOrchestrator::new(backend.clone());
    let items = UploadItem::batch(blobs(&["a.csv", "b.csv", "c.csv"]));

    let outcome = orchestrator.process(&items, &request("M-7")).await.unwrap();
    assert_eq!(outcome.record_ids.len(), 2);

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.len(), 3);
    let failed = &snapshot[&1];
    let message = failed.error().unwrap();
    assert!(message.starts_with("record creation failed"));
    assert!(message.contains("machine not found"));
}

#[tokio::test]
async fn failures_keep_the_progress_of_the_last_finished_step() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .fail_store("a.csv")
            .fail_record("b.csv"),
    );
    let orchestrator = UploadOrchestrator::new(backend.clone());
    let items = UploadItem::batch(blobs(&["a.csv", "b.csv", "c.csv"]));

    orchestrator.process(&items, &request("M-7")).await.unwrap();

    let snapshot = orchestrator.snapshot().await;
    // storage failed: only the start milestone was reached
    assert_eq!(snapshot[&0].progress, 10);
    assert!(snapshot[&0].error().is_some());
    // record creation failed: the file itself was stored
    assert_eq!(snapshot[&1].progress, 50);
    assert!(snapshot[&1].error().is_some());
    assert_eq!(snapshot[&2].progress, 100);
    assert!(matches!(snapshot[&2].state, UploadState::Completed { .. }));
}

#[tokio::test]
async fn stored_file_shows_half_progress_while_record_is_created() {
    let gate = Arc::new(Semaphore::new(0));
    let backend = Arc::new(ScriptedBackend::new().with_record_gate(gate.clone()));
    let orchestrator = UploadOrchestrator::new(backend.clone());
    let items = UploadItem::batch(blobs(&["a.csv"]));

    let watch = async {
        while !backend.calls().contains(&"record:a.csv".to_string()) {
            tokio::task::yield_now().await;
        }
        let during = orchestrator.snapshot().await[&0].clone();
        gate.add_permits(1);
        during
    };
    let req = request("M-7");
    let (outcome, during) = tokio::join!(orchestrator.process(&items, &req), watch);

    assert_eq!(during.progress, 50);
    assert_eq!(during.state, UploadState::Uploading);
    assert!(outcome.unwrap().all_succeeded());
    assert_eq!(orchestrator.snapshot().await[&0].progress, 100);
}

#[tokio::test]
async fn every_entry_is_terminal_and_record_id_iff_completed() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .fail_store("s2.csv")
            .fail_record("s4.csv"),
    );
    let orchestrator =
        UploadOrchestrator::new(backend.clone()).with_queue(WorkQueue::bounded(3));
    let names = ["s1.csv", "s2.csv", "s3.csv", "s4.csv", "s5.csv"];
    let items = UploadItem::batch(blobs(&names));

    orchestrator.process(&items, &request("M-1")).await.unwrap();

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.len(), names.len());
    for status in snapshot.values() {
        assert!(status.state.is_terminal());
        let completed = matches!(status.state, UploadState::Completed { .. });
        assert_eq!(status.record_id().is_some(), completed);
        if completed {
            assert_eq!(status.progress, 100);
        }
    }
}

#[tokio::test]
async fn sequential_processing_follows_index_order() {
    let backend = Arc::new(ScriptedBackend::new());
    let orchestrator = UploadOrchestrator::new(backend.clone());
    let items = UploadItem::batch(blobs(&["one.csv", "two.csv"]));

    orchestrator.process(&items, &request("M-1")).await.unwrap();

    assert_eq!(
        backend.calls(),
        vec![
            "store:one.csv",
            "record:one.csv",
            "store:two.csv",
            "record:two.csv"
        ]
    );
}

#[tokio::test]
async fn validation_fails_before_any_backend_call() {
    let backend = Arc::new(ScriptedBackend::new());
    let orchestrator = UploadOrchestrator::new(backend.clone());

    let err = orchestrator.process(&[], &request("M-1")).await.unwrap_err();
    assert_eq!(err, ValidationError::NoFiles);

    let items = UploadItem::batch(blobs(&["a.csv"]));
    let err = orchestrator.process(&items, &request("  ")).await.unwrap_err();
    assert_eq!(err, ValidationError::NoMachine);

    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn session_without_selection_rejects_processing() {
    let session = DiagnoseSession::new(Arc::new(ScriptedBackend::new()));
    let err = session.process(&request("M-1")).await.unwrap_err();
    assert!(matches!(err, SessionError::Validation(ValidationError::NoFiles)));
}

#[tokio::test]
async fn selecting_a_batch_resets_statuses_to_pending() {
    let session = DiagnoseSession::new(Arc::new(ScriptedBackend::new()));
    session.select_batch(blobs(&["a.csv"])).await;
    session.process(&request("M-1")).await.unwrap();

    session.select_batch(blobs(&["x.csv", "y.csv"])).await;
    let stages = session.stages().await;
    assert_eq!(stages.len(), 2);
    assert!(stages.iter().all(|s| s.stage == RecordStage::Pending));
    assert!(!session.all_completed().await);
}

#[tokio::test]
async fn machine_is_auto_selected_when_not_given() {
    let backend = Arc::new(ScriptedBackend::new().with_machines(&["M-9", "M-10"]));
    let session = DiagnoseSession::new(backend.clone());

    assert_eq!(session.resolve_machine(None).await.unwrap(), "M-9");
    assert_eq!(session.resolve_machine(Some("M-10")).await.unwrap(), "M-10");

    let empty = DiagnoseSession::new(Arc::new(ScriptedBackend::new()));
    assert!(matches!(
        empty.resolve_machine(Some("")).await,
        Err(SessionError::NoMachines)
    ));
}

#[tokio::test]
async fn reset_discards_everything() {
    let session = DiagnoseSession::new(Arc::new(ScriptedBackend::new()));
    session.select_batch(blobs(&["a.csv"])).await;
    session.process(&request("M-1")).await.unwrap();
    session.analyze().await;

    session.reset().await;

    assert!(session.stages().await.is_empty());
    assert!(session.results().await.is_empty());
    assert!(!session.all_completed().await);
}
