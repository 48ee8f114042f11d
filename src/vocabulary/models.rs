/*!
 * Core vocabulary data types shared across the filtering pipeline.
 */

use std::fmt;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// CEFR proficiency level, ordered easiest to hardest.
///
/// `Unknown` marks words without a dictionary record; it sorts above C2 so
/// that level-based policies treat undictionaried words as hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CefrLevel {
    A1,
    #[default]
    A2,
    B1,
    B2,
    C1,
    C2,
    /// No dictionary record exists for this word
    #[serde(rename = "unknown")]
    Unknown,
}

impl CefrLevel {
    /// All concrete levels, easiest first (excludes `Unknown`)
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    /// Uppercase tag used in artifacts and store rows
    pub fn as_str(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
            CefrLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CefrLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "A1" => Ok(CefrLevel::A1),
            "A2" => Ok(CefrLevel::A2),
            "B1" => Ok(CefrLevel::B1),
            "B2" => Ok(CefrLevel::B2),
            "C1" => Ok(CefrLevel::C1),
            "C2" => Ok(CefrLevel::C2),
            "UNKNOWN" => Ok(CefrLevel::Unknown),
            _ => Err(anyhow!("Invalid CEFR level: {}", s)),
        }
    }
}

/// Classification outcome for a single word token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WordStatus {
    /// The learner does not know this word; it blocks comprehension
    Active,
    /// The lemma is in the learner's known set
    Known,
}

/// One word occurrence inside a segment.
///
/// The classifier writes status, lemma and level back onto the token so the
/// same occurrence is never lemmatized twice within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordToken {
    /// Surface form as it appears in the text
    pub text: String,

    /// Start time inherited from the owning segment, in ms
    pub start_time_ms: u64,

    /// End time inherited from the owning segment, in ms
    pub end_time_ms: u64,

    /// Classification status, set by the classifier
    pub status: WordStatus,

    /// Resolved lemma, None until classified
    pub lemma: Option<String>,

    /// Dictionary difficulty level, None until classified
    pub difficulty_level: Option<CefrLevel>,

    /// Dictionary row id when a record was matched
    pub dictionary_id: Option<i64>,
}

impl WordToken {
    /// Create an unclassified token; status defaults to Active until the
    /// classifier has decided otherwise
    pub fn new(text: &str, start_time_ms: u64, end_time_ms: u64) -> Self {
        Self {
            text: text.to_string(),
            start_time_ms,
            end_time_ms,
            status: WordStatus::Active,
            lemma: None,
            difficulty_level: None,
            dictionary_id: None,
        }
    }

    /// Lemma if resolved, lowercased surface form otherwise
    pub fn lemma_or_surface(&self) -> String {
        self.lemma
            .clone()
            .unwrap_or_else(|| self.text.to_lowercase())
    }

    /// Whether the classifier already ran on this token
    pub fn is_classified(&self) -> bool {
        self.lemma.is_some()
    }
}

/// Read-only dictionary entry, owned by the dictionary store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyRecord {
    /// Store row id
    pub id: i64,

    /// Surface form the record is keyed by
    pub word: String,

    /// Canonical dictionary form
    pub lemma: String,

    /// ISO 639-1 language code
    pub language: String,

    /// CEFR difficulty level
    pub level: CefrLevel,

    /// Part of speech tag (e.g. "noun", "verb")
    pub part_of_speech: Option<String>,

    /// Grammatical gender where the language has one
    pub gender: Option<String>,

    /// Translations into the learner's reference language
    pub translations: Vec<String>,

    /// Corpus frequency rank, lower is more common
    pub frequency_rank: Option<u32>,
}
