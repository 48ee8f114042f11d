/*!
 * Filtering scenario tests driving parser, classifier and coordinator
 * together over the mock adapters.
 */

use std::collections::HashSet;
use std::sync::Arc;

use lexisub::filtering::{FilterSettings, FilteringCoordinator};
use lexisub::subtitle_processor::TimedTextParser;
use lexisub::vocabulary::{
    CefrLevel, VocabularyLookupCache, VocabularyRecordBuilder, WordClassifier, WordValidator,
};

use crate::common;

fn coordinator() -> FilteringCoordinator {
    let cache = VocabularyLookupCache::new(Arc::new(common::seeded_dictionary()));
    let classifier = WordClassifier::new(Arc::new(common::seeded_lemmatizer()), cache);
    FilteringCoordinator::new(WordValidator::new(), classifier)
}

fn known(words: &[&str]) -> HashSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn settings() -> FilterSettings {
    FilterSettings::new("de", CefrLevel::A2, "tester")
}

#[tokio::test]
async fn test_filter_fixture_shouldPartitionAllThreeWays() {
    common::init_logging();
    let segments = TimedTextParser::parse(common::GERMAN_FIXTURE).unwrap();
    // learner knows running and speed vocabulary, but not the dog or sleeping
    let known = known(&["ich", "bin", "hier", "laufen", "schnell", "schlafen"]);

    let result = coordinator()
        .filter(&segments, &known, &settings(), None)
        .await
        .unwrap();

    // "Der Hund läuft schnell": only "Hund" unknown
    // "Ich bin hier": everything known or functional
    // "Der Hund schläft": only "Hund" unknown
    assert_eq!(result.statistics.empty_count, 1);
    assert_eq!(result.statistics.single_blocker_count, 2);
    assert_eq!(result.statistics.learning_count, 0);
    assert_eq!(result.blocker_words, vec!["hund"]);
}

#[tokio::test]
async fn test_filter_unknownContentWords_shouldYieldLearningSegment() {
    common::init_logging();
    let segments = TimedTextParser::parse(common::GERMAN_FIXTURE).unwrap();
    let known = known(&["ich", "bin", "hier"]);

    let result = coordinator()
        .filter(&segments, &known, &settings(), None)
        .await
        .unwrap();

    // both dog segments have 2+ unknown content words now
    assert_eq!(result.statistics.learning_count, 2);
    assert_eq!(result.statistics.empty_count, 1);
    assert_eq!(result.empty_subtitles[0].text, "Ich bin hier");

    let learning = &result.learning_subtitles[0];
    assert!(learning.active_count() >= 2);
    assert!(learning.active_words.iter().any(|t| t.lemma.as_deref() == Some("hund")));
}

#[tokio::test]
async fn test_refilter_afterLearningBlockers_shouldFollowReductionLaw() {
    common::init_logging();
    let input = "1\n00:00:01,000 --> 00:00:02,000\nDer Hund hier\n\n2\n00:00:03,000 --> 00:00:04,000\nIch bin läuft\n\n3\n00:00:05,000 --> 00:00:06,000\nDas schläft gern\n";
    let segments = TimedTextParser::parse(input).unwrap();
    let known = known(&["gern"]);

    let result = coordinator()
        .filter(&segments, &known, &settings(), None)
        .await
        .unwrap();
    assert_eq!(result.blocker_words.len(), 3);

    let newly_known: HashSet<String> = ["hund".to_string()].into();
    let report = FilteringCoordinator::refilter(&result, &newly_known);

    assert_eq!(
        report.known_blockers.len() + report.unknown_blockers.len(),
        result.blocker_words.len()
    );
    assert_eq!(report.known_blockers, vec!["hund"]);
    assert_eq!(report.unknown_blockers.len(), 2);
    assert!((report.reduction_percentage - 33.3).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_filter_overlappingSegments_shouldStillClassify() {
    common::init_logging();
    let input = "1\n00:00:01,000 --> 00:00:05,000\nDer Hund läuft\n\n2\n00:00:04,000 --> 00:00:06,000\nIch bin hier\n";
    let segments = TimedTextParser::parse(input).unwrap();

    let warnings = TimedTextParser::validate(&segments);
    assert_eq!(warnings.len(), 1);

    let result = coordinator()
        .filter(&segments, &known(&["ich", "bin", "hier"]), &settings(), None)
        .await
        .unwrap();

    assert_eq!(result.statistics.total_subtitles, 2);
}

#[tokio::test]
async fn test_recordBuilder_overFilterResult_shouldDeduplicateAcrossSegments() {
    common::init_logging();
    let input = "1\n00:00:01,000 --> 00:00:02,000\nDer Hund hier\n\n2\n00:00:03,000 --> 00:00:04,000\nHunde hier gern\n";
    let segments = TimedTextParser::parse(input).unwrap();

    let result = coordinator()
        .filter(&segments, &known(&["gern"]), &settings(), None)
        .await
        .unwrap();

    let tokens = FilteringCoordinator::active_tokens(&result);
    let builder = VocabularyRecordBuilder::new("de");
    let items = builder.build(&tokens, &std::collections::BTreeMap::new());

    // "Hund" and "Hunde" collapse onto the lemma "hund"
    let hund = items.iter().find(|i| i.word == "hund").unwrap();
    assert_eq!(hund.occurrences, 2);
    assert_eq!(hund.id, VocabularyRecordBuilder::item_id("hund", CefrLevel::A1));
}
