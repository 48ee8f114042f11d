/*!
 * Segment classification and partitioning.
 *
 * The coordinator drives a whole filtering run: tokenize each segment,
 * classify the candidate words, then partition segments by their count of
 * unknown words. Per-segment classification runs concurrently, but results
 * are reported in the original segment order and aggregation uses only
 * counts and set unions, so parallel and sequential runs agree.
 */

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;

use crate::errors::DependencyError;
use crate::filtering::models::{AnnotatedSegment, FilteringResult, FilteringStatistics, RefilterReport};
use crate::subtitle_processor::TimedSegment;
use crate::vocabulary::{CefrLevel, WordClassifier, WordStatus, WordToken, WordValidator};

/// Default number of segments classified concurrently
pub const DEFAULT_SEGMENT_CONCURRENCY: usize = 8;

/// Settings for one filtering run
#[derive(Debug, Clone)]
pub struct FilterSettings {
    /// ISO 639-1 language of the segments
    pub language: String,

    /// Target proficiency level
    pub target_level: CefrLevel,

    /// The learner the run belongs to
    pub user_id: String,

    /// How many segments to classify concurrently
    pub segment_concurrency: usize,
}

impl FilterSettings {
    /// Settings with the default concurrency
    pub fn new(language: &str, target_level: CefrLevel, user_id: &str) -> Self {
        Self {
            language: language.to_lowercase(),
            target_level,
            user_id: user_id.to_string(),
            segment_concurrency: DEFAULT_SEGMENT_CONCURRENCY,
        }
    }
}

/// Callback invoked after each classified segment with (done, total)
pub type SegmentProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// Coordinates word classification across segments and builds the partition
pub struct FilteringCoordinator {
    validator: WordValidator,
    classifier: WordClassifier,
}

impl FilteringCoordinator {
    /// Create a coordinator from its two sub-components
    pub fn new(validator: WordValidator, classifier: WordClassifier) -> Self {
        Self { validator, classifier }
    }

    /// Run the full classification and partition pass.
    ///
    /// Segments are classified concurrently up to the configured limit;
    /// the returned partitions preserve the input order.
    pub async fn filter(
        &self,
        segments: &[TimedSegment],
        known_lemmas: &HashSet<String>,
        settings: &FilterSettings,
        on_progress: Option<&SegmentProgressFn>,
    ) -> Result<FilteringResult, DependencyError> {
        let total = segments.len();
        let completed = AtomicUsize::new(0);

        let annotated: Vec<AnnotatedSegment> = stream::iter(segments.iter().cloned())
            .map(|segment| {
                let completed = &completed;
                async move {
                    let annotated = self.classify_segment(segment, known_lemmas, settings).await?;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(callback) = on_progress {
                        callback(done, total);
                    }
                    Ok::<AnnotatedSegment, DependencyError>(annotated)
                }
            })
            .buffered(settings.segment_concurrency.max(1))
            .try_collect()
            .await?;

        Ok(self.partition(annotated, settings))
    }

    /// Classify every eligible token of one segment
    async fn classify_segment(
        &self,
        segment: TimedSegment,
        known_lemmas: &HashSet<String>,
        settings: &FilterSettings,
    ) -> Result<AnnotatedSegment, DependencyError> {
        let mut tokens = Vec::new();

        for word in WordValidator::tokenize(&segment.text) {
            if !self.validator.is_valid_candidate(&word, &settings.language) {
                continue;
            }

            let mut token = WordToken::new(&word, segment.start_time_ms, segment.end_time_ms);
            self.classifier
                .classify(&mut token, known_lemmas, settings.target_level, &settings.language)
                .await?;
            tokens.push(token);
        }

        let active_words: Vec<WordToken> = tokens
            .iter()
            .filter(|t| t.status == WordStatus::Active)
            .cloned()
            .collect();

        Ok(AnnotatedSegment { segment, tokens, active_words })
    }

    /// Partition annotated segments and aggregate statistics
    fn partition(&self, annotated: Vec<AnnotatedSegment>, settings: &FilterSettings) -> FilteringResult {
        let total = annotated.len();

        let mut learning = Vec::new();
        let mut single_blocker = Vec::new();
        let mut empty = Vec::new();
        let mut blocker_words = Vec::new();
        let mut seen_blockers = HashSet::new();

        for segment in annotated {
            match segment.active_count() {
                0 => empty.push(segment.segment),
                1 => {
                    let lemma = segment.active_words[0].lemma_or_surface();
                    if seen_blockers.insert(lemma.clone()) {
                        blocker_words.push(lemma);
                    }
                    single_blocker.push(segment);
                }
                _ => learning.push(segment),
            }
        }

        debug!(
            "Partitioned {} segments: {} empty, {} single-blocker, {} learning",
            total,
            empty.len(),
            single_blocker.len(),
            learning.len()
        );

        let statistics = FilteringStatistics {
            total_subtitles: total,
            empty_count: empty.len(),
            single_blocker_count: single_blocker.len(),
            learning_count: learning.len(),
            unique_blocker_count: blocker_words.len(),
            language: settings.language.clone(),
            level: settings.target_level,
            user_id: settings.user_id.clone(),
        };

        FilteringResult {
            learning_subtitles: learning,
            single_blocker_subtitles: single_blocker,
            empty_subtitles: empty,
            blocker_words,
            statistics,
        }
    }

    /// Second pass: split the original blocker list against newly known
    /// lemmas without re-parsing or re-classifying anything.
    pub fn refilter(original: &FilteringResult, newly_known: &HashSet<String>) -> RefilterReport {
        let mut known_blockers = Vec::new();
        let mut unknown_blockers = Vec::new();

        for blocker in &original.blocker_words {
            if newly_known.contains(blocker) {
                known_blockers.push(blocker.clone());
            } else {
                unknown_blockers.push(blocker.clone());
            }
        }

        debug_assert_eq!(
            known_blockers.len() + unknown_blockers.len(),
            original.blocker_words.len()
        );

        let original_count = original.blocker_words.len();
        let reduction_percentage = if original_count == 0 {
            0.0
        } else {
            let ratio = known_blockers.len() as f64 / original_count as f64;
            (ratio * 1000.0).round() / 10.0
        };

        RefilterReport {
            known_blockers,
            unknown_blockers,
            reduction_percentage,
        }
    }

    /// Every ACTIVE token across all partitions, in segment order
    pub fn active_tokens(result: &FilteringResult) -> Vec<WordToken> {
        let mut tokens = Vec::new();
        let mut segments: Vec<&AnnotatedSegment> = result
            .single_blocker_subtitles
            .iter()
            .chain(result.learning_subtitles.iter())
            .collect();
        segments.sort_by_key(|s| s.segment.index);

        for segment in segments {
            tokens.extend(segment.active_words.iter().cloned());
        }
        tokens
    }
}
