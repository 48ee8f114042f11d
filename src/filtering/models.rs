/*!
 * Result types for the segment filtering pass.
 */

use serde::{Deserialize, Serialize};

use crate::subtitle_processor::TimedSegment;
use crate::vocabulary::{CefrLevel, WordToken};

/// A segment together with its classified tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedSegment {
    /// The underlying segment
    pub segment: TimedSegment,

    /// Every candidate token, after classification
    pub tokens: Vec<WordToken>,

    /// The subset of tokens still ACTIVE (unknown to the learner)
    pub active_words: Vec<WordToken>,
}

impl AnnotatedSegment {
    /// Number of words blocking comprehension of this segment
    pub fn active_count(&self) -> usize {
        self.active_words.len()
    }
}

/// Aggregated counts and context for one filtering run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteringStatistics {
    /// Total number of input segments
    pub total_subtitles: usize,

    /// Segments where every word is known
    pub empty_count: usize,

    /// Segments blocked by exactly one word
    pub single_blocker_count: usize,

    /// Segments with two or more unknown words
    pub learning_count: usize,

    /// Distinct lemmas in the blocker list
    pub unique_blocker_count: usize,

    /// ISO 639-1 language code of the run
    pub language: String,

    /// Target proficiency level of the run
    pub level: CefrLevel,

    /// The learner the run was executed for
    pub user_id: String,
}

/// Immutable outcome of one filtering run.
///
/// Every input segment lands in exactly one of the three partitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteringResult {
    /// Segments with 2+ unknown words, kept with their active tokens
    pub learning_subtitles: Vec<AnnotatedSegment>,

    /// Segments blocked by exactly one word
    pub single_blocker_subtitles: Vec<AnnotatedSegment>,

    /// Segments the learner fully understands
    pub empty_subtitles: Vec<TimedSegment>,

    /// De-duplicated blocking lemmas from the single-blocker segments,
    /// in first-occurrence order
    pub blocker_words: Vec<String>,

    /// Aggregated statistics and run context
    pub statistics: FilteringStatistics,
}

impl FilteringResult {
    /// Sum of all partition sizes; equals `statistics.total_subtitles`
    pub fn partitioned_count(&self) -> usize {
        self.learning_subtitles.len() + self.single_blocker_subtitles.len() + self.empty_subtitles.len()
    }
}

/// Outcome of the second filtering pass after the learner marked words known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefilterReport {
    /// Blockers from the original run that are now known
    pub known_blockers: Vec<String>,

    /// Blockers that still block
    pub unknown_blockers: Vec<String>,

    /// Share of original blockers eliminated, rounded to one decimal;
    /// 0.0 when the original run had no blockers
    pub reduction_percentage: f64,
}

impl RefilterReport {
    /// Number of blockers in the original run
    pub fn original_count(&self) -> usize {
        self.known_blockers.len() + self.unknown_blockers.len()
    }
}
