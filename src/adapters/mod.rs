/*!
 * Adapter contracts for the external collaborators of the pipeline.
 *
 * The classification core never talks to a model or a database directly;
 * it goes through these traits so backends can be swapped per deployment:
 * - `mock`: configurable in-memory adapters for tests
 * - `sqlite`: rusqlite-backed dictionary and known-word stores
 * - `http`: JSON clients for remote lemmatizer/translator services
 */

use std::collections::HashSet;
use std::fmt::Debug;
use std::path::Path;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::errors::DependencyError;
use crate::subtitle_processor::TimedSegment;
use crate::vocabulary::{CefrLevel, VocabularyRecord};

/// Resolves a surface form to its canonical dictionary form.
///
/// Implementations must be deterministic per model version. Failures are
/// typed; the classifier decides the fallback (surface form as lemma).
#[async_trait]
pub trait Lemmatizer: Send + Sync + Debug {
    /// Resolve the lemma for a word in the given language
    async fn lemmatize(&self, word: &str, language: &str) -> Result<String, DependencyError>;
}

/// Read-only access to the persistent dictionary.
///
/// A missing word is `Ok(None)` — an expected outcome, never an error.
#[async_trait]
pub trait DictionaryStore: Send + Sync + Debug {
    /// Look up a single word
    async fn get_word(
        &self,
        word: &str,
        language: &str,
    ) -> Result<Option<VocabularyRecord>, DependencyError>;

    /// Page through all records of one level
    async fn get_words_by_level(
        &self,
        language: &str,
        level: CefrLevel,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<VocabularyRecord>, DependencyError>;
}

/// Read-only access to the learner's progress state
#[async_trait]
pub trait UserProgressStore: Send + Sync + Debug {
    /// The set of lemmas the user already knows in this language
    async fn known_lemmas(
        &self,
        user_id: &str,
        language: &str,
    ) -> Result<HashSet<String>, DependencyError>;
}

/// Produces ordered time-coded segments from an audio file
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    /// Transcribe an audio file into ordered segments
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<TimedSegment>, DependencyError>;
}

/// Translates text between languages
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate `text` from `source` to `target` language
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, DependencyError>;
}

/// Closed set of adapter backends a deployment can select.
///
/// Dispatch goes through this enum rather than a name-keyed registry so an
/// unsupported backend is a compile-time impossibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterBackend {
    /// In-memory mock adapters (tests, dry runs)
    #[default]
    Mock,
    /// Local SQLite stores
    Sqlite,
    /// Remote HTTP services
    Http,
}

impl std::fmt::Display for AdapterBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AdapterBackend::Mock => "mock",
            AdapterBackend::Sqlite => "sqlite",
            AdapterBackend::Http => "http",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for AdapterBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(AdapterBackend::Mock),
            "sqlite" => Ok(AdapterBackend::Sqlite),
            "http" => Ok(AdapterBackend::Http),
            _ => Err(anyhow!("Invalid adapter backend: {}", s)),
        }
    }
}

pub mod http;
pub mod mock;
pub mod sqlite;
