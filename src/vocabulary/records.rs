/*!
 * Building client-facing vocabulary items from classified tokens.
 *
 * Every active token collapses into at most one item per
 * (lemma-or-surface, level) pair, identified by a deterministic digest so
 * clients can merge results across runs without duplicate entries.
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::vocabulary::{CefrLevel, VocabularyRecord, WordStatus, WordToken};

/// Length of the hex identifier derived from the digest
const ITEM_ID_LEN: usize = 16;

/// One de-duplicated vocabulary item for client consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    /// Deterministic identifier derived from (word, level)
    pub id: String,

    /// Lemma when resolved, surface form otherwise
    pub word: String,

    /// Surface form of the first occurrence
    pub surface: String,

    /// ISO 639-1 language code
    pub language: String,

    /// CEFR difficulty level ("unknown" for undictionaried words)
    pub level: CefrLevel,

    /// Part of speech when a dictionary record was matched
    pub part_of_speech: Option<String>,

    /// Translations when a dictionary record was matched
    pub translations: Vec<String>,

    /// Corpus frequency rank when known
    pub frequency_rank: Option<u32>,

    /// How many times the word occurred across the run
    pub occurrences: usize,

    /// Start time of the first occurrence, in seconds
    pub first_seen_at: f64,
}

/// Builds de-duplicated vocabulary items from active tokens
pub struct VocabularyRecordBuilder {
    language: String,
}

impl VocabularyRecordBuilder {
    /// Create a builder for one language
    pub fn new(language: &str) -> Self {
        Self { language: language.to_lowercase() }
    }

    /// Deterministic identifier for a (word, level) pair.
    ///
    /// First 16 hex chars of SHA-256 over `"{word}:{level}"` — identical
    /// inputs across runs always produce identical ids.
    pub fn item_id(word: &str, level: CefrLevel) -> String {
        let digest = Sha256::digest(format!("{}:{}", word.to_lowercase(), level));
        format!("{:x}", digest)[..ITEM_ID_LEN].to_string()
    }

    /// Collapse active tokens into sorted, de-duplicated items.
    ///
    /// Tokens still marked KNOWN are ignored. The first occurrence of a
    /// (word, level) pair wins for the surface form and timing; later ones
    /// only bump the occurrence count. Records enrich items where the
    /// token carries a dictionary match.
    pub fn build(
        &self,
        tokens: &[WordToken],
        records: &BTreeMap<String, VocabularyRecord>,
    ) -> Vec<VocabularyItem> {
        let mut items: BTreeMap<(String, CefrLevel), VocabularyItem> = BTreeMap::new();

        for token in tokens {
            if token.status != WordStatus::Active {
                continue;
            }

            let word = token.lemma_or_surface();
            let level = token.difficulty_level.unwrap_or(CefrLevel::Unknown);
            let key = (word.clone(), level);

            match items.get_mut(&key) {
                Some(existing) => {
                    existing.occurrences += 1;
                }
                None => {
                    let record = records.get(&word);
                    items.insert(
                        key,
                        VocabularyItem {
                            id: Self::item_id(&word, level),
                            word,
                            surface: token.text.clone(),
                            language: self.language.clone(),
                            level,
                            part_of_speech: record.and_then(|r| r.part_of_speech.clone()),
                            translations: record.map(|r| r.translations.clone()).unwrap_or_default(),
                            frequency_rank: record.and_then(|r| r.frequency_rank),
                            occurrences: 1,
                            first_seen_at: token.start_time_ms as f64 / 1000.0,
                        },
                    );
                }
            }
        }

        items.into_values().collect()
    }
}
