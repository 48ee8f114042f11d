/*!
 * Vocabulary handling: eligibility, lookup caching, classification and
 * client-facing record building.
 *
 * - `models`: shared data types (levels, tokens, dictionary records)
 * - `validator`: pure per-token eligibility checks
 * - `cache`: read-through TTL cache over the dictionary store
 * - `classifier`: per-word ACTIVE/KNOWN decisions
 * - `records`: de-duplicated vocabulary items with deterministic ids
 */

// Re-export main types for easier usage
pub use self::cache::{CacheStats, VocabularyLookupCache};
pub use self::classifier::{LevelPolicy, WordClassifier};
pub use self::models::{CefrLevel, VocabularyRecord, WordStatus, WordToken};
pub use self::records::{VocabularyItem, VocabularyRecordBuilder};
pub use self::validator::{ValidatorLimits, WordValidator};

// Submodules
pub mod cache;
pub mod classifier;
pub mod models;
pub mod records;
pub mod validator;
