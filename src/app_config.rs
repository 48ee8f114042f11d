use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::adapters::AdapterBackend;
use crate::language_utils;
use crate::vocabulary::{CefrLevel, LevelPolicy, ValidatorLimits, WordValidator};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Subtitle language code (ISO 639-1)
    #[serde(default = "default_language")]
    pub language: String,

    /// Learner's target proficiency level
    #[serde(default)]
    pub target_level: CefrLevel,

    /// User the runs belong to
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Filtering settings
    #[serde(default)]
    pub filtering: FilteringConfig,

    /// Vocabulary cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Adapter backend settings
    #[serde(default)]
    pub adapters: AdapterConfig,

    /// Background task settings
    #[serde(default)]
    pub tasks: TaskConfig,

    /// Directory where result artifacts are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: default_language(),
            target_level: CefrLevel::default(),
            user_id: default_user_id(),
            filtering: FilteringConfig::default(),
            cache: CacheConfig::default(),
            adapters: AdapterConfig::default(),
            tasks: TaskConfig::default(),
            output_dir: default_output_dir(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to open config file: {:?}", path.as_ref()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Write the configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_language_code(&self.language)?;

        if !WordValidator::supported_languages().contains(&self.language.as_str()) {
            log::warn!(
                "No stopword table for language '{}'; only length checks will apply",
                self.language
            );
        }

        if self.filtering.min_word_len == 0 {
            return Err(anyhow!("min_word_len must be at least 1"));
        }
        if self.filtering.min_word_len > self.filtering.max_word_len {
            return Err(anyhow!(
                "min_word_len {} exceeds max_word_len {}",
                self.filtering.min_word_len,
                self.filtering.max_word_len
            ));
        }
        if self.filtering.segment_concurrency == 0 {
            return Err(anyhow!("segment_concurrency must be at least 1"));
        }
        if self.tasks.max_concurrent_jobs == 0 {
            return Err(anyhow!("max_concurrent_jobs must be at least 1"));
        }

        if self.adapters.backend == AdapterBackend::Http {
            if self.adapters.lemmatizer_endpoint.is_empty() {
                return Err(anyhow!("http backend requires a lemmatizer endpoint"));
            }
            if self.filtering.translate_missing && self.adapters.translator_endpoint.is_empty() {
                return Err(anyhow!(
                    "translate_missing with http backend requires a translator endpoint"
                ));
            }
        }

        Ok(())
    }

    /// Validator limits derived from the filtering settings
    pub fn validator_limits(&self) -> ValidatorLimits {
        ValidatorLimits {
            min_len: self.filtering.min_word_len,
            max_len: self.filtering.max_word_len,
        }
    }
}

/// Filtering settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilteringConfig {
    /// Minimum candidate word length
    #[serde(default = "default_min_word_len")]
    pub min_word_len: usize,

    /// Maximum candidate word length
    #[serde(default = "default_max_word_len")]
    pub max_word_len: usize,

    /// Segments classified concurrently
    #[serde(default = "default_segment_concurrency")]
    pub segment_concurrency: usize,

    /// Whether unknown words below the target level still block
    #[serde(default)]
    pub level_policy: LevelPolicyConfig,

    /// Fill missing translations through the translator adapter
    #[serde(default)]
    pub translate_missing: bool,

    /// Target language for filled-in translations
    #[serde(default = "default_translation_language")]
    pub translation_language: String,
}

impl Default for FilteringConfig {
    fn default() -> Self {
        Self {
            min_word_len: default_min_word_len(),
            max_word_len: default_max_word_len(),
            segment_concurrency: default_segment_concurrency(),
            level_policy: LevelPolicyConfig::default(),
            translate_missing: false,
            translation_language: default_translation_language(),
        }
    }
}

/// Serializable mirror of the classifier level policy
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LevelPolicyConfig {
    /// Any unknown lemma blocks, whatever its own level
    #[default]
    BlockAllUnknown,
    /// Unknown lemmas below the target level do not block
    IgnoreBelowTarget,
}

impl From<LevelPolicyConfig> for LevelPolicy {
    fn from(config: LevelPolicyConfig) -> Self {
        match config {
            LevelPolicyConfig::BlockAllUnknown => LevelPolicy::BlockAllUnknown,
            LevelPolicyConfig::IgnoreBelowTarget => LevelPolicy::IgnoreBelowTarget,
        }
    }
}

/// Vocabulary cache settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// TTL for single-word entries, in seconds
    #[serde(default = "default_word_ttl_secs")]
    pub word_ttl_secs: u64,

    /// TTL for level bulk reads, in seconds
    #[serde(default = "default_level_ttl_secs")]
    pub level_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            word_ttl_secs: default_word_ttl_secs(),
            level_ttl_secs: default_level_ttl_secs(),
        }
    }
}

/// Adapter backend settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdapterConfig {
    /// Which adapter family to use
    #[serde(default)]
    pub backend: AdapterBackend,

    /// Lemmatizer service URL (http backend)
    #[serde(default)]
    pub lemmatizer_endpoint: String,

    /// Translator service URL (http backend)
    #[serde(default)]
    pub translator_endpoint: String,

    /// Database file (sqlite backend); None selects the per-user default
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            backend: AdapterBackend::default(),
            lemmatizer_endpoint: String::new(),
            translator_endpoint: String::new(),
            database_path: None,
        }
    }
}

/// Background task settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaskConfig {
    /// Jobs allowed to run concurrently on the worker pool
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_language() -> String {
    "de".to_string()
}

fn default_user_id() -> String {
    "local".to_string()
}

fn default_min_word_len() -> usize {
    3
}

fn default_max_word_len() -> usize {
    50
}

fn default_segment_concurrency() -> usize {
    8
}

fn default_word_ttl_secs() -> u64 {
    3600
}

fn default_level_ttl_secs() -> u64 {
    4 * 3600
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_translation_language() -> String {
    "en".to_string()
}

fn default_output_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .map(|d| d.join("lexisub").join("artifacts"))
        .unwrap_or_else(|| PathBuf::from("artifacts"))
}
