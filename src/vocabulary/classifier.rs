/*!
 * Per-word classification.
 *
 * Decides ACTIVE vs KNOWN for one token: resolve the lemma through the
 * lemmatizer adapter, check the learner's known set, then consult the
 * dictionary through the lookup cache. The decision is a pure function of
 * (lemma, dictionary level, known set, target level, policy), so repeated
 * classification of identical inputs always agrees.
 */

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, warn};

use crate::adapters::Lemmatizer;
use crate::errors::DependencyError;
use crate::vocabulary::cache::VocabularyLookupCache;
use crate::vocabulary::{CefrLevel, WordStatus, WordToken};

/// How to treat dictionary-known words the learner has not marked known.
///
/// The observed product behavior does not pin down whether a word *below*
/// the target level should still block; the conservative default says it
/// does. `IgnoreBelowTarget` implements the alternative reading and is
/// awaiting product confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelPolicy {
    /// Any lemma outside the known set is ACTIVE, whatever its own level
    #[default]
    BlockAllUnknown,
    /// Lemmas whose dictionary level is strictly below the target count as known
    IgnoreBelowTarget,
}

/// Classifies word tokens against a learner's state
pub struct WordClassifier {
    lemmatizer: Arc<dyn Lemmatizer>,
    cache: VocabularyLookupCache,
    policy: LevelPolicy,
}

impl WordClassifier {
    /// Create a classifier with the default level policy
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>, cache: VocabularyLookupCache) -> Self {
        Self::with_policy(lemmatizer, cache, LevelPolicy::default())
    }

    /// Create a classifier with an explicit level policy
    pub fn with_policy(
        lemmatizer: Arc<dyn Lemmatizer>,
        cache: VocabularyLookupCache,
        policy: LevelPolicy,
    ) -> Self {
        Self { lemmatizer, cache, policy }
    }

    /// The active level policy
    pub fn policy(&self) -> LevelPolicy {
        self.policy
    }

    /// Classify one token in place.
    ///
    /// Writes status, lemma, level and dictionary id back onto the token.
    /// A token that already carries a lemma is not re-lemmatized. Store
    /// failures propagate and fail the owning task; lemmatizer failures
    /// degrade to the surface form.
    pub async fn classify(
        &self,
        token: &mut WordToken,
        known_lemmas: &HashSet<String>,
        target_level: CefrLevel,
        language: &str,
    ) -> Result<WordStatus, DependencyError> {
        let lemma = match &token.lemma {
            Some(cached) => cached.clone(),
            None => {
                let resolved = match self.lemmatizer.lemmatize(&token.text, language).await {
                    Ok(lemma) => lemma.to_lowercase(),
                    Err(e) => {
                        warn!(
                            "Lemmatizer failed for '{}', falling back to surface form: {}",
                            token.text, e
                        );
                        token.text.to_lowercase()
                    }
                };
                token.lemma = Some(resolved.clone());
                resolved
            }
        };

        if known_lemmas.contains(&lemma) {
            token.status = WordStatus::Known;
            return Ok(WordStatus::Known);
        }

        let record = self.cache.get_word(&lemma, language).await?;

        let status = match record {
            Some(record) => {
                token.difficulty_level = Some(record.level);
                token.dictionary_id = Some(record.id);

                match self.policy {
                    LevelPolicy::IgnoreBelowTarget if record.level < target_level => {
                        debug!(
                            "'{}' ({}) below target {}, treated as known by policy",
                            lemma, record.level, target_level
                        );
                        WordStatus::Known
                    }
                    _ => WordStatus::Active,
                }
            }
            None => {
                // No dictionary record: still a blocker, level unknown
                token.difficulty_level = Some(CefrLevel::Unknown);
                token.dictionary_id = None;
                WordStatus::Active
            }
        };

        token.status = status;
        Ok(status)
    }
}

impl Clone for WordClassifier {
    fn clone(&self) -> Self {
        Self {
            lemmatizer: Arc::clone(&self.lemmatizer),
            cache: self.cache.clone(),
            policy: self.policy,
        }
    }
}
