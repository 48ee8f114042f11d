/*!
 * Segment filtering: classification, partitioning and the second-pass
 * refilter over a finished result.
 *
 * - `models`: result, statistics and refilter report types
 * - `coordinator`: the run driver
 */

// Re-export main types for easier usage
pub use self::coordinator::{
    DEFAULT_SEGMENT_CONCURRENCY, FilterSettings, FilteringCoordinator, SegmentProgressFn,
};
pub use self::models::{AnnotatedSegment, FilteringResult, FilteringStatistics, RefilterReport};

// Submodules
pub mod coordinator;
pub mod models;
