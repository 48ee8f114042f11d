/*!
 * Mock adapter implementations for testing.
 *
 * Each mock can be configured to simulate a different backend behavior:
 * - `working()` constructors always succeed
 * - `failing()` constructors always return a dependency error
 * - `intermittent(n)` fails every nth call
 */

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::adapters::{DictionaryStore, Lemmatizer, Transcriber, Translator, UserProgressStore};
use crate::errors::DependencyError;
use crate::subtitle_processor::TimedSegment;
use crate::vocabulary::{CefrLevel, VocabularyRecord};

/// Failure pattern shared by the mock adapters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails every nth call
    Intermittent {
        /// Every how-many-th call fails
        fail_every: usize,
    },
    /// Always fails
    Failing,
}

impl MockBehavior {
    fn check(&self, count: usize, what: &str) -> Result<(), DependencyError> {
        match self {
            MockBehavior::Working => Ok(()),
            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(DependencyError::Protocol {
                        status_code: 503,
                        message: format!("Simulated intermittent {} failure (call #{})", what, count + 1),
                    })
                } else {
                    Ok(())
                }
            }
            MockBehavior::Failing => Err(DependencyError::Store(format!(
                "Simulated {} failure",
                what
            ))),
        }
    }
}

/// Mock lemmatizer with an explicit surface-to-lemma mapping.
///
/// Unmapped words resolve to their lowercased surface form.
#[derive(Debug)]
pub struct MockLemmatizer {
    mappings: HashMap<String, String>,
    behavior: MockBehavior,
    call_count: Arc<AtomicUsize>,
}

impl MockLemmatizer {
    /// A lemmatizer that lowercases every word
    pub fn identity() -> Self {
        Self {
            mappings: HashMap::new(),
            behavior: MockBehavior::Working,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A lemmatizer that always fails
    pub fn failing() -> Self {
        Self {
            mappings: HashMap::new(),
            behavior: MockBehavior::Failing,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a surface-to-lemma mapping (case-insensitive surface)
    pub fn with_mapping(mut self, surface: &str, lemma: &str) -> Self {
        self.mappings.insert(surface.to_lowercase(), lemma.to_lowercase());
        self
    }

    /// Counter of lemmatize calls, shared across clones
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

#[async_trait]
impl Lemmatizer for MockLemmatizer {
    async fn lemmatize(&self, word: &str, _language: &str) -> Result<String, DependencyError> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.behavior
            .check(count, "lemmatizer")
            .map_err(|_| DependencyError::Lemmatizer("Simulated lemmatizer failure".to_string()))?;

        let lowered = word.to_lowercase();
        Ok(self.mappings.get(&lowered).cloned().unwrap_or(lowered))
    }
}

/// In-memory dictionary store keyed by (lemma, language)
#[derive(Debug)]
pub struct MockDictionaryStore {
    records: RwLock<HashMap<(String, String), VocabularyRecord>>,
    behavior: MockBehavior,
    lookup_count: Arc<AtomicUsize>,
    next_id: AtomicUsize,
}

impl MockDictionaryStore {
    /// An empty, always-working store
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            behavior: MockBehavior::Working,
            lookup_count: Arc::new(AtomicUsize::new(0)),
            next_id: AtomicUsize::new(1),
        }
    }

    /// A store that fails every lookup
    pub fn failing() -> Self {
        Self {
            behavior: MockBehavior::Failing,
            ..Self::new()
        }
    }

    /// Insert a dictionary record with sensible defaults
    pub fn insert_word(&self, lemma: &str, language: &str, level: CefrLevel, translations: &[&str]) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        let record = VocabularyRecord {
            id,
            word: lemma.to_lowercase(),
            lemma: lemma.to_lowercase(),
            language: language.to_lowercase(),
            level,
            part_of_speech: None,
            gender: None,
            translations: translations.iter().map(|t| t.to_string()).collect(),
            frequency_rank: None,
        };
        self.records
            .write()
            .insert((record.lemma.clone(), record.language.clone()), record);
    }

    /// How many lookups reached this store (cache effectiveness probe)
    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }
}

impl Default for MockDictionaryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DictionaryStore for MockDictionaryStore {
    async fn get_word(
        &self,
        word: &str,
        language: &str,
    ) -> Result<Option<VocabularyRecord>, DependencyError> {
        let count = self.lookup_count.fetch_add(1, Ordering::SeqCst);
        self.behavior.check(count, "dictionary store")?;

        Ok(self
            .records
            .read()
            .get(&(word.to_lowercase(), language.to_lowercase()))
            .cloned())
    }

    async fn get_words_by_level(
        &self,
        language: &str,
        level: CefrLevel,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<VocabularyRecord>, DependencyError> {
        let count = self.lookup_count.fetch_add(1, Ordering::SeqCst);
        self.behavior.check(count, "dictionary store")?;

        let language = language.to_lowercase();
        let mut matching: Vec<VocabularyRecord> = self
            .records
            .read()
            .values()
            .filter(|r| r.language == language && r.level == level)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.lemma.cmp(&b.lemma));

        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }
}

/// In-memory user progress store
#[derive(Debug)]
pub struct MockUserProgressStore {
    known: RwLock<HashMap<(String, String), HashSet<String>>>,
    behavior: MockBehavior,
}

impl MockUserProgressStore {
    /// An empty, always-working store
    pub fn new() -> Self {
        Self {
            known: RwLock::new(HashMap::new()),
            behavior: MockBehavior::Working,
        }
    }

    /// A store that fails every read
    pub fn failing() -> Self {
        Self {
            behavior: MockBehavior::Failing,
            ..Self::new()
        }
    }

    /// Record lemmas the user knows
    pub fn set_known(&self, user_id: &str, language: &str, lemmas: &[&str]) {
        self.known.write().insert(
            (user_id.to_string(), language.to_lowercase()),
            lemmas.iter().map(|l| l.to_lowercase()).collect(),
        );
    }
}

impl Default for MockUserProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserProgressStore for MockUserProgressStore {
    async fn known_lemmas(
        &self,
        user_id: &str,
        language: &str,
    ) -> Result<HashSet<String>, DependencyError> {
        self.behavior.check(0, "user progress store")?;

        Ok(self
            .known
            .read()
            .get(&(user_id.to_string(), language.to_lowercase()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Mock transcriber returning preconfigured segments
#[derive(Debug)]
pub struct MockTranscriber {
    segments: Vec<TimedSegment>,
    behavior: MockBehavior,
}

impl MockTranscriber {
    /// A transcriber returning the given segments for every file
    pub fn returning(segments: Vec<TimedSegment>) -> Self {
        Self {
            segments,
            behavior: MockBehavior::Working,
        }
    }

    /// A transcriber that always fails
    pub fn failing() -> Self {
        Self {
            segments: Vec::new(),
            behavior: MockBehavior::Failing,
        }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _audio_path: &Path) -> Result<Vec<TimedSegment>, DependencyError> {
        self.behavior
            .check(0, "transcriber")
            .map_err(|_| DependencyError::Transcriber("Simulated transcriber failure".to_string()))?;
        Ok(self.segments.clone())
    }
}

/// Mock translator producing a tagged echo of the input
#[derive(Debug)]
pub struct MockTranslator {
    behavior: MockBehavior,
    call_count: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// A translator that always succeeds
    pub fn working() -> Self {
        Self {
            behavior: MockBehavior::Working,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A translator that always fails
    pub fn failing() -> Self {
        Self {
            behavior: MockBehavior::Failing,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A translator failing every nth call
    pub fn intermittent(fail_every: usize) -> Self {
        Self {
            behavior: MockBehavior::Intermittent { fail_every },
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source: &str,
        target: &str,
    ) -> Result<String, DependencyError> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.behavior
            .check(count, "translator")
            .map_err(|_| DependencyError::Translator("Simulated translator failure".to_string()))?;
        Ok(format!("[{}] {}", target, text))
    }
}
