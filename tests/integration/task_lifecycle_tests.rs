/*!
 * Task lifecycle tests: failure containment, concurrent runs, and the
 * behavior of the shared cache across tasks.
 */

use std::sync::Arc;

use lexisub::adapters::mock::{MockDictionaryStore, MockLemmatizer, MockUserProgressStore};
use lexisub::orchestrator::{FilteringRequest, TaskOrchestrator};
use lexisub::progress::{NotificationMessage, ProgressBroadcaster, ProgressTracker, TaskStatus};

use crate::common;

/// Orchestrator whose dictionary store always fails
fn failing_orchestrator(output_dir: &std::path::Path) -> TaskOrchestrator {
    TaskOrchestrator::new(
        common::test_config(output_dir),
        Arc::new(MockLemmatizer::identity()),
        Arc::new(MockDictionaryStore::failing()),
        Arc::new(MockUserProgressStore::new()),
        None,
        None,
        ProgressTracker::new(ProgressBroadcaster::new()),
    )
}

#[tokio::test]
async fn test_storeFailure_shouldFailTaskWithCapturedError() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();
    let orchestrator = failing_orchestrator(output.path());

    let task_id = orchestrator
        .submit(FilteringRequest::new(common::GERMAN_FIXTURE, "lesson"))
        .unwrap();

    let progress = common::wait_for_terminal(&orchestrator, &task_id).await;

    assert_eq!(progress.status, TaskStatus::Failed);
    assert!(progress.error.is_some());
    assert!(progress.completed_at.is_some());
}

#[tokio::test]
async fn test_storeFailure_shouldReachPushChannelAsError() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();
    let orchestrator = failing_orchestrator(output.path());

    let (_, mut rx) = orchestrator.tracker().broadcaster().subscribe("tester");
    let task_id = orchestrator
        .submit(FilteringRequest::new(common::GERMAN_FIXTURE, "lesson"))
        .unwrap();
    common::wait_for_terminal(&orchestrator, &task_id).await;

    let mut saw_error = false;
    while let Ok(message) = rx.try_recv() {
        if let NotificationMessage::Error { task_id: id, .. } = message {
            assert_eq!(id, task_id);
            saw_error = true;
        }
    }
    assert!(saw_error);
}

#[tokio::test]
async fn test_oneFailingTask_shouldNotAffectConcurrentTasks() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();

    // the healthy and the failing run share nothing but the machine
    let healthy = common::test_orchestrator(output.path(), &[]);
    let failing = failing_orchestrator(output.path());

    let ok_task = healthy
        .submit(FilteringRequest::new(common::GERMAN_FIXTURE, "good"))
        .unwrap();
    let bad_task = failing
        .submit(FilteringRequest::new(common::GERMAN_FIXTURE, "bad"))
        .unwrap();

    let ok_progress = common::wait_for_terminal(&healthy, &ok_task).await;
    let bad_progress = common::wait_for_terminal(&failing, &bad_task).await;

    assert_eq!(ok_progress.status, TaskStatus::Completed);
    assert_eq!(bad_progress.status, TaskStatus::Failed);
}

#[tokio::test]
async fn test_concurrentSubmissions_shouldAllComplete() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();
    let orchestrator = common::test_orchestrator(output.path(), &["ich", "bin", "hier"]);

    let task_ids: Vec<String> = (0..6)
        .map(|i| {
            orchestrator
                .submit(FilteringRequest::new(
                    common::GERMAN_FIXTURE,
                    &format!("lesson{:02}", i),
                ))
                .unwrap()
        })
        .collect();

    for task_id in &task_ids {
        let progress = common::wait_for_terminal(&orchestrator, task_id).await;
        assert_eq!(progress.status, TaskStatus::Completed);
    }

    // distinct tasks, all registered for the same user
    let tasks = orchestrator.tracker().tasks_for_user("tester");
    assert_eq!(tasks.len(), 6);
}

#[tokio::test]
async fn test_sharedCache_acrossRuns_shouldServeSecondRunFromCache() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();
    let orchestrator = common::test_orchestrator(output.path(), &[]);

    let first = orchestrator
        .submit(FilteringRequest::new(common::GERMAN_FIXTURE, "first"))
        .unwrap();
    common::wait_for_terminal(&orchestrator, &first).await;
    let misses_after_first = orchestrator.cache().stats().misses;

    let second = orchestrator
        .submit(FilteringRequest::new(common::GERMAN_FIXTURE, "second"))
        .unwrap();
    common::wait_for_terminal(&orchestrator, &second).await;
    let stats = orchestrator.cache().stats();

    // the second run found every word already cached
    assert_eq!(stats.misses, misses_after_first);
    assert!(stats.hits > 0);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn test_refilter_viaOrchestrator_shouldMatchCoordinatorLaw() {
    common::init_logging();
    let output = tempfile::tempdir().unwrap();
    let orchestrator = common::test_orchestrator(output.path(), &[]);

    // build a result directly through the coordinator path
    let segments = lexisub::subtitle_processor::TimedTextParser::parse(common::GERMAN_FIXTURE).unwrap();
    let cache = lexisub::vocabulary::VocabularyLookupCache::new(Arc::new(common::seeded_dictionary()));
    let classifier = lexisub::vocabulary::WordClassifier::new(Arc::new(common::seeded_lemmatizer()), cache);
    let coordinator = lexisub::filtering::FilteringCoordinator::new(
        lexisub::vocabulary::WordValidator::new(),
        classifier,
    );
    let settings = lexisub::filtering::FilterSettings::new(
        "de",
        lexisub::vocabulary::CefrLevel::A2,
        "tester",
    );
    let known: std::collections::HashSet<String> =
        ["ich", "bin", "hier", "laufen", "schnell", "schlafen"]
            .iter()
            .map(|w| w.to_string())
            .collect();
    let result = coordinator.filter(&segments, &known, &settings, None).await.unwrap();

    let newly_known: std::collections::HashSet<String> = ["hund".to_string()].into();
    let report = orchestrator.refilter(&result, &newly_known);

    assert_eq!(
        report.known_blockers.len() + report.unknown_blockers.len(),
        result.blocker_words.len()
    );
    assert!((report.reduction_percentage - 100.0).abs() < f64::EPSILON);
}
