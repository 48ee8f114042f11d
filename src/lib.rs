/*!
 * # Lexisub - Subtitle Vocabulary Filtering
 *
 * A Rust library for classifying time-coded subtitle text against a
 * learner's vocabulary and proficiency level.
 *
 * ## Features
 *
 * - Parse and serialize SRT-style time-coded text (LF/CRLF, dual-language)
 * - Partition segments into fully-known, single-blocker and learning sets
 * - Per-word classification through a pluggable lemmatizer and dictionary
 * - Read-through vocabulary cache with TTL and graceful degradation
 * - Second-pass refiltering as the learner marks words known
 * - Background task execution with push and poll progress channels
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: Time-coded text parsing and validation
 * - `vocabulary`: Word eligibility, caching, classification, records:
 *   - `vocabulary::validator`: Per-token eligibility checks
 *   - `vocabulary::cache`: Read-through dictionary cache
 *   - `vocabulary::classifier`: ACTIVE/KNOWN decisions
 *   - `vocabulary::records`: De-duplicated vocabulary items
 * - `filtering`: Segment partitioning and refiltering
 * - `progress`: Task progress cells, poll registry, push broadcaster
 * - `adapters`: Contracts and backends for external collaborators:
 *   - `adapters::mock`: In-memory test adapters
 *   - `adapters::sqlite`: SQLite dictionary and known-word stores
 *   - `adapters::http`: Remote lemmatizer/translator clients
 * - `orchestrator`: Background run wiring and artifact persistence
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod adapters;
pub mod app_config;
pub mod errors;
pub mod file_utils;
pub mod filtering;
pub mod language_utils;
pub mod orchestrator;
pub mod progress;
pub mod subtitle_processor;
pub mod vocabulary;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, CacheError, DependencyError, InputError, NotFoundError};
pub use filtering::{FilteringCoordinator, FilteringResult, RefilterReport};
pub use language_utils::{get_language_name, language_codes_match};
pub use orchestrator::{FilteringRequest, TaskOrchestrator};
pub use progress::{NotificationMessage, ProgressBroadcaster, ProgressTracker, TaskStatus};
pub use subtitle_processor::{TimedSegment, TimedTextParser};
pub use vocabulary::{VocabularyLookupCache, WordClassifier, WordValidator};
