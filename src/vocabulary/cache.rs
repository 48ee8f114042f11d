/*!
 * Read-through caching over the dictionary store.
 *
 * Lookups hit an in-memory TTL cache first and fall through to the store on
 * miss, writing the result back (including negative results, so repeated
 * misses for unknown words stay cheap). A failing cache path must never fail
 * classification: errors are counted, logged as warnings, and the caller is
 * served directly from the store.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::RwLock;

use crate::adapters::DictionaryStore;
use crate::errors::{CacheError, DependencyError};
use crate::vocabulary::{CefrLevel, VocabularyRecord};

/// Default TTL for single-word entries
pub const DEFAULT_WORD_TTL: Duration = Duration::from_secs(3600);

/// Level bulk reads change rarely; they keep 4x the single-word TTL
pub const DEFAULT_LEVEL_TTL: Duration = Duration::from_secs(4 * 3600);

/// Cache key for a single word lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WordKey {
    word: String,
    language: String,
}

impl WordKey {
    fn new(word: &str, language: &str) -> Self {
        Self {
            word: word.to_lowercase(),
            language: language.to_lowercase(),
        }
    }
}

/// Cache key for a by-level bulk read
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LevelKey {
    language: String,
    level: CefrLevel,
    limit: usize,
    offset: usize,
}

struct CachedEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CachedEntry<T> {
    fn fresh(value: T, ttl: Duration) -> Self {
        Self { value, expires_at: Instant::now() + ttl }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Counters describing cache effectiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: usize,
    /// Lookups that fell through to the store
    pub misses: usize,
    /// Cache-path failures that degraded to direct store access
    pub errors: usize,
}

impl CacheStats {
    /// Hit rate in [0,1]; 0 when nothing was looked up yet
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Read-through vocabulary cache shared across concurrent runs.
///
/// Cloning shares the underlying storage and counters.
pub struct VocabularyLookupCache {
    store: Arc<dyn DictionaryStore>,
    words: Arc<RwLock<HashMap<WordKey, CachedEntry<Option<VocabularyRecord>>>>>,
    levels: Arc<RwLock<HashMap<LevelKey, CachedEntry<Vec<VocabularyRecord>>>>>,
    stats: Arc<RwLock<CacheStats>>,
    word_ttl: Duration,
    level_ttl: Duration,
}

impl VocabularyLookupCache {
    /// Create a cache over the given store with default TTLs
    pub fn new(store: Arc<dyn DictionaryStore>) -> Self {
        Self::with_ttl(store, DEFAULT_WORD_TTL, DEFAULT_LEVEL_TTL)
    }

    /// Create a cache with custom TTLs
    pub fn with_ttl(store: Arc<dyn DictionaryStore>, word_ttl: Duration, level_ttl: Duration) -> Self {
        Self {
            store,
            words: Arc::new(RwLock::new(HashMap::new())),
            levels: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(CacheStats::default())),
            word_ttl,
            level_ttl,
        }
    }

    /// Look up a single word, read-through.
    ///
    /// `Ok(None)` is a dictionary miss — an expected outcome, cached like any
    /// other value. Store failures propagate; cache failures never do.
    pub async fn get_word(
        &self,
        word: &str,
        language: &str,
    ) -> Result<Option<VocabularyRecord>, DependencyError> {
        let key = WordKey::new(word, language);

        match self.read_cached_word(&key) {
            Ok(Some(value)) => {
                self.stats.write().hits += 1;
                return Ok(value);
            }
            Ok(None) => {
                self.stats.write().misses += 1;
            }
            Err(e) => {
                self.stats.write().errors += 1;
                warn!("Vocabulary cache read failed, degrading to store: {}", e);
            }
        }

        let value = self.store.get_word(word, language).await?;

        if let Some(mut words) = self.words.try_write() {
            words.insert(key, CachedEntry::fresh(value.clone(), self.word_ttl));
        } else {
            self.stats.write().errors += 1;
            warn!("Vocabulary cache write-back skipped under contention");
        }

        Ok(value)
    }

    /// Bulk read of one level's records, read-through
    pub async fn get_words_by_level(
        &self,
        language: &str,
        level: CefrLevel,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<VocabularyRecord>, DependencyError> {
        let key = LevelKey {
            language: language.to_lowercase(),
            level,
            limit,
            offset,
        };

        {
            let levels = self.levels.read();
            if let Some(entry) = levels.get(&key) {
                if !entry.is_expired() {
                    self.stats.write().hits += 1;
                    debug!("Level cache hit for {}/{}", key.language, level);
                    return Ok(entry.value.clone());
                }
            }
        }
        self.stats.write().misses += 1;

        let value = self
            .store
            .get_words_by_level(language, level, limit, offset)
            .await?;

        self.levels
            .write()
            .insert(key, CachedEntry::fresh(value.clone(), self.level_ttl));

        Ok(value)
    }

    /// Non-blocking cache read: `Ok(Some)` hit, `Ok(None)` miss, `Err` when
    /// the cache itself is unavailable (lock contention) and the caller
    /// should go straight to the store.
    fn read_cached_word(
        &self,
        key: &WordKey,
    ) -> Result<Option<Option<VocabularyRecord>>, CacheError> {
        let words = self
            .words
            .try_read()
            .ok_or_else(|| CacheError::Backend("word cache busy".to_string()))?;
        match words.get(key) {
            Some(entry) if !entry.is_expired() => Ok(Some(entry.value.clone())),
            _ => Ok(None),
        }
    }

    /// Drop the cached entry for one word
    pub fn invalidate_word(&self, word: &str, language: &str) {
        self.words.write().remove(&WordKey::new(word, language));
    }

    /// Drop all cached bulk reads for one level of a language
    pub fn invalidate_level(&self, language: &str, level: CefrLevel) {
        let language = language.to_lowercase();
        self.levels
            .write()
            .retain(|k, _| !(k.language == language && k.level == level));
    }

    /// Drop every cached entry belonging to a language
    pub fn invalidate_language(&self, language: &str) {
        let language = language.to_lowercase();
        self.words.write().retain(|k, _| k.language != language);
        self.levels.write().retain(|k, _| k.language != language);
    }

    /// Drop everything
    pub fn invalidate_all(&self) {
        self.words.write().clear();
        self.levels.write().clear();
        debug!("Vocabulary cache cleared");
    }

    /// Snapshot of the hit/miss/error counters
    pub fn stats(&self) -> CacheStats {
        *self.stats.read()
    }

    /// Number of cached word entries
    pub fn len(&self) -> usize {
        self.words.read().len()
    }

    /// Whether no word entries are cached
    pub fn is_empty(&self) -> bool {
        self.words.read().is_empty()
    }
}

impl Clone for VocabularyLookupCache {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            words: Arc::clone(&self.words),
            levels: Arc::clone(&self.levels),
            stats: Arc::clone(&self.stats),
            word_ttl: self.word_ttl,
            level_ttl: self.level_ttl,
        }
    }
}
