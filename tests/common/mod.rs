/*!
 * Shared helpers for the lexisub test suite.
 */

use std::sync::Arc;

use lexisub::adapters::mock::{MockDictionaryStore, MockLemmatizer, MockUserProgressStore};
use lexisub::app_config::Config;
use lexisub::orchestrator::TaskOrchestrator;
use lexisub::progress::{ProgressBroadcaster, ProgressTracker, TaskStatus};
use lexisub::vocabulary::CefrLevel;

/// A small German subtitle fixture: one learning segment, one known segment,
/// one single-blocker segment.
pub const GERMAN_FIXTURE: &str = "1\n00:00:01,000 --> 00:00:03,000\nDer Hund läuft schnell\n\n2\n00:00:04,000 --> 00:00:06,000\nIch bin hier\n\n3\n00:00:07,000 --> 00:00:09,000\nDer Hund schläft\n";

/// Initialize test logging once; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Seed a mock dictionary with the fixture vocabulary
pub fn seeded_dictionary() -> MockDictionaryStore {
    let store = MockDictionaryStore::new();
    store.insert_word("hund", "de", CefrLevel::A1, &["dog"]);
    store.insert_word("laufen", "de", CefrLevel::A2, &["to run"]);
    store.insert_word("schlafen", "de", CefrLevel::A2, &["to sleep"]);
    store.insert_word("schnell", "de", CefrLevel::A1, &["fast"]);
    store
}

/// A lemmatizer that knows the fixture's inflections
pub fn seeded_lemmatizer() -> MockLemmatizer {
    MockLemmatizer::identity()
        .with_mapping("läuft", "laufen")
        .with_mapping("schläft", "schlafen")
        .with_mapping("hunde", "hund")
}

/// Test config writing artifacts into the given directory
pub fn test_config(output_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.language = "de".to_string();
    config.target_level = CefrLevel::A2;
    config.user_id = "tester".to_string();
    config.output_dir = output_dir.to_path_buf();
    config
}

/// Build an orchestrator over mock adapters.
///
/// The user "tester" knows the lemmas passed in `known`.
pub fn test_orchestrator(output_dir: &std::path::Path, known: &[&str]) -> TaskOrchestrator {
    let progress_store = MockUserProgressStore::new();
    progress_store.set_known("tester", "de", known);

    TaskOrchestrator::new(
        test_config(output_dir),
        Arc::new(seeded_lemmatizer()),
        Arc::new(seeded_dictionary()),
        Arc::new(progress_store),
        None,
        None,
        ProgressTracker::new(ProgressBroadcaster::new()),
    )
}

/// Poll a task until it reaches a terminal state, with a hard timeout
pub async fn wait_for_terminal(
    orchestrator: &TaskOrchestrator,
    task_id: &str,
) -> lexisub::progress::TaskProgress {
    let deadline = std::time::Duration::from_secs(10);
    let poll = async {
        loop {
            let progress = orchestrator.poll(task_id).expect("task should be registered");
            if matches!(progress.status, TaskStatus::Completed | TaskStatus::Failed) {
                return progress;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    };

    tokio::time::timeout(deadline, poll)
        .await
        .expect("task did not reach a terminal state in time")
}
