/*!
 * End-to-end workflow tests: submit, watch both notification channels,
 * inspect the persisted artifacts.
 */

use lexisub::file_utils::FileManager;
use lexisub::orchestrator::FilteringRequest;
use lexisub::progress::{NotificationMessage, TaskStatus};

use crate::common;

#[tokio::test]
async fn test_submit_fixture_shouldCompleteAndPersistArtifacts() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();
    let orchestrator = common::test_orchestrator(output.path(), &["ich", "bin", "hier"]);

    let task_id = orchestrator
        .submit(FilteringRequest::new(common::GERMAN_FIXTURE, "lesson01"))
        .unwrap();

    let progress = common::wait_for_terminal(&orchestrator, &task_id).await;

    assert_eq!(progress.status, TaskStatus::Completed);
    assert_eq!(progress.progress, 100);
    assert!(progress.error.is_none());

    // JSON artifact
    let artifact_path = progress.result_path.expect("artifact path should be set");
    let artifact_json = FileManager::read_to_string(&artifact_path).unwrap();
    let artifact: serde_json::Value = serde_json::from_str(&artifact_json).unwrap();

    assert_eq!(artifact["total_subtitles"], 3);
    assert_eq!(artifact["statistics"]["language"], "de");
    assert_eq!(artifact["statistics"]["user_id"], "tester");
    assert!(artifact["items"].as_array().unwrap().len() >= 1);

    // highlighted companion file wraps unknown vocabulary
    let highlighted_path = output.path().join("lesson01.highlighted.srt");
    let highlighted = FileManager::read_to_string(&highlighted_path).unwrap();
    assert!(highlighted.contains("<b>Hund</b>"));
    assert!(highlighted.contains("Ich bin hier"));
}

#[tokio::test]
async fn test_submit_emptyText_shouldRejectBeforeTaskCreation() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();
    let orchestrator = common::test_orchestrator(output.path(), &[]);

    let result = orchestrator.submit(FilteringRequest::new("   ", "empty"));

    assert!(result.is_err());
    // nothing was registered for the rejected submission
    assert!(orchestrator.tracker().tasks_for_user("tester").is_empty());
}

#[tokio::test]
async fn test_submit_invalidLanguage_shouldRejectBeforeTaskCreation() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();
    let orchestrator = common::test_orchestrator(output.path(), &[]);

    let mut request = FilteringRequest::new(common::GERMAN_FIXTURE, "lesson");
    request.language = Some("nope".to_string());

    assert!(orchestrator.submit(request).is_err());
    assert!(orchestrator.tracker().tasks_for_user("tester").is_empty());
}

#[tokio::test]
async fn test_submit_malformedBlocks_shouldStillProcessGoodOnes() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();
    let orchestrator = common::test_orchestrator(output.path(), &[]);

    let mixed = "1\n00:00:01,000 --> 00:00:02,000\nDer Hund läuft\n\nbroken block\nwithout timestamps\n";
    let task_id = orchestrator
        .submit(FilteringRequest::new(mixed, "mixed"))
        .unwrap();

    let progress = common::wait_for_terminal(&orchestrator, &task_id).await;

    assert_eq!(progress.status, TaskStatus::Completed);
    assert_eq!(progress.result.unwrap()["total_subtitles"], 1);
}

#[tokio::test]
async fn test_pushChannel_shouldSeeMonotonicProgressToCompletion() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();
    let orchestrator = common::test_orchestrator(output.path(), &[]);

    let (_, mut rx) = orchestrator.tracker().broadcaster().subscribe("tester");

    let task_id = orchestrator
        .submit(FilteringRequest::new(common::GERMAN_FIXTURE, "lesson"))
        .unwrap();
    common::wait_for_terminal(&orchestrator, &task_id).await;

    let mut observed = Vec::new();
    while let Ok(message) = rx.try_recv() {
        if let NotificationMessage::Progress { progress, task_id: id, .. } = message {
            assert_eq!(id, task_id);
            observed.push(progress);
        }
    }

    assert!(!observed.is_empty());
    assert!(observed.windows(2).all(|w| w[0] <= w[1]), "progress regressed: {:?}", observed);
    assert_eq!(*observed.last().unwrap(), 100);
}

#[tokio::test]
async fn test_pollChannel_shouldExposeSameTerminalStateAsPush() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();
    let orchestrator = common::test_orchestrator(output.path(), &[]);

    let (_, mut rx) = orchestrator.tracker().broadcaster().subscribe("tester");
    let task_id = orchestrator
        .submit(FilteringRequest::new(common::GERMAN_FIXTURE, "lesson"))
        .unwrap();

    let polled = common::wait_for_terminal(&orchestrator, &task_id).await;

    let mut last_pushed_status = None;
    while let Ok(message) = rx.try_recv() {
        if let NotificationMessage::Progress { status, .. } = message {
            last_pushed_status = Some(status);
        }
    }

    assert_eq!(polled.status, TaskStatus::Completed);
    assert_eq!(last_pushed_status, Some(TaskStatus::Completed));
}

#[tokio::test]
async fn test_poll_unknownTask_shouldReturnNotFound() {
    let output = tempfile::tempdir().unwrap();
    let orchestrator = common::test_orchestrator(output.path(), &[]);

    assert!(orchestrator.poll("no-such-task").is_err());
}
