/*!
 * Per-token eligibility checks.
 *
 * A word has to clear three hurdles before it is worth classifying:
 * a length window, the language's functional-word table (articles,
 * pronouns, common auxiliary conjugations, number words), and the
 * interjection table. Everything here is pure and stateless.
 */

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Length window for candidate words
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValidatorLimits {
    /// Minimum length in characters
    pub min_len: usize,
    /// Maximum length in characters
    pub max_len: usize,
}

impl Default for ValidatorLimits {
    fn default() -> Self {
        Self { min_len: 3, max_len: 50 }
    }
}

static STOPWORDS: Lazy<HashMap<&'static str, HashSet<&'static str>>> = Lazy::new(|| {
    let mut tables = HashMap::new();

    tables.insert(
        "de",
        HashSet::from([
            // Articles and contractions
            "der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "einem", "einer",
            "eines", "ins", "zur", "zum", "vom", "beim", "ans", "aufs",
            // Pronouns
            "ich", "du", "er", "sie", "es", "wir", "ihr", "mich", "dich", "sich", "uns", "euch",
            "mir", "dir", "ihm", "ihnen", "mein", "dein", "sein", "unser", "euer", "wer", "was",
            "man", "dies", "diese", "dieser", "dieses", "jene", "jener", "alle", "etwas", "nichts",
            // Auxiliary and modal conjugations
            "bin", "bist", "ist", "sind", "seid", "war", "waren", "habe", "hast", "hat", "haben",
            "habt", "hatte", "hatten", "werde", "wirst", "wird", "werden", "wurde", "wurden",
            "kann", "kannst", "muss", "musst", "will", "soll", "darf", "mag",
            // Conjunctions, prepositions, particles
            "und", "oder", "aber", "denn", "doch", "wenn", "als", "wie", "dass", "weil", "ob",
            "auf", "aus", "bei", "mit", "nach", "von", "vor", "für", "gegen", "ohne", "durch",
            "über", "unter", "zwischen", "nicht", "auch", "nur", "noch", "schon", "sehr", "hier",
            "da", "dort", "dann", "denn", "so", "ja", "nein",
            // Number words
            "eins", "zwei", "drei", "vier", "fünf", "sechs", "sieben", "acht", "neun", "zehn",
            "elf", "zwölf", "hundert", "tausend",
        ]),
    );

    tables.insert(
        "en",
        HashSet::from([
            // Articles and determiners
            "the", "an", "this", "that", "these", "those", "some", "any", "each", "every",
            // Pronouns
            "you", "she", "him", "her", "its", "our", "your", "their", "they", "them", "his",
            "who", "what", "which", "mine", "yours", "ours", "theirs", "himself", "herself",
            "myself", "yourself", "itself",
            // Auxiliary conjugations
            "are", "was", "were", "been", "being", "have", "has", "had", "having", "does", "did",
            "will", "would", "shall", "should", "can", "could", "may", "might", "must",
            // Conjunctions, prepositions, particles
            "and", "but", "for", "nor", "yet", "with", "from", "into", "onto", "over", "under",
            "about", "after", "before", "between", "through", "during", "not", "too", "very",
            "here", "there", "then", "than", "when", "where", "why", "how",
            // Number words
            "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
            "eleven", "twelve", "hundred", "thousand",
        ]),
    );

    tables.insert(
        "es",
        HashSet::from([
            // Articles and contractions
            "los", "las", "una", "uno", "unos", "unas", "del", "al",
            // Pronouns
            "yo", "tú", "él", "ella", "usted", "nosotros", "vosotros", "ellos", "ellas", "ustedes",
            "mío", "tuyo", "suyo", "nuestro", "vuestro", "este", "esta", "esto", "ese", "esa",
            "eso", "aquel", "quien", "que", "cual", "algo", "nada", "nadie", "todo", "toda",
            // Auxiliary conjugations
            "soy", "eres", "somos", "son", "era", "eran", "fue", "fueron", "estoy", "está",
            "estás", "estamos", "están", "estaba", "estaban", "hay", "había", "tengo", "tiene",
            "tienes", "tenemos", "tienen", "puedo", "puede", "debo", "debe",
            // Conjunctions, prepositions, particles
            "para", "por", "con", "sin", "sobre", "entre", "hasta", "desde", "durante", "pero",
            "porque", "cuando", "donde", "como", "muy", "más", "menos", "también", "tampoco",
            "aquí", "allí", "entonces", "así",
            // Number words
            "dos", "tres", "cuatro", "cinco", "seis", "siete", "ocho", "nueve", "diez", "once",
            "doce", "cien", "mil",
        ]),
    );

    tables
});

static INTERJECTIONS: Lazy<HashMap<&'static str, HashSet<&'static str>>> = Lazy::new(|| {
    let mut tables = HashMap::new();
    tables.insert("de", HashSet::from(["ach", "aha", "hmm", "naja", "tja", "oje", "hey", "huch", "pfui", "igitt"]));
    tables.insert("en", HashSet::from(["ooh", "aah", "hmm", "huh", "wow", "oops", "ouch", "yeah", "hey", "ugh"]));
    tables.insert("es", HashSet::from(["ay", "uf", "eh", "oh", "vaya", "ojalá", "anda", "olé", "uy", "bah"]));
    tables
});

/// Pure per-token, per-language eligibility check
#[derive(Debug, Clone, Default)]
pub struct WordValidator {
    limits: ValidatorLimits,
}

impl WordValidator {
    /// Create a validator with the default 3..=50 length window
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with custom length limits
    pub fn with_limits(limits: ValidatorLimits) -> Self {
        Self { limits }
    }

    /// Whether a token is worth sending to the classifier.
    ///
    /// Checks run in order: length window, stopword table, interjection
    /// table. Languages without tables fall back to the length check only.
    pub fn is_valid_candidate(&self, token: &str, language: &str) -> bool {
        let normalized = token.trim().to_lowercase();
        let char_count = normalized.chars().count();

        if char_count < self.limits.min_len || char_count > self.limits.max_len {
            return false;
        }

        let lang = language.to_lowercase();

        if let Some(table) = STOPWORDS.get(lang.as_str()) {
            if table.contains(normalized.as_str()) {
                return false;
            }
        }

        if let Some(table) = INTERJECTIONS.get(lang.as_str()) {
            if table.contains(normalized.as_str()) {
                return false;
            }
        }

        true
    }

    /// Split a segment line into candidate word strings.
    ///
    /// Strips surrounding punctuation, keeps word-internal apostrophes and
    /// hyphens ("doesn't", "Apfel-Kuchen"), and drops tokens with no
    /// alphabetic content.
    pub fn tokenize(text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(|raw| {
                raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
                    .trim_matches(|c| c == '\'' || c == '-')
            })
            .filter(|w| !w.is_empty() && w.chars().any(char::is_alphabetic))
            .map(str::to_string)
            .collect()
    }

    /// Languages with a bundled stopword table
    pub fn supported_languages() -> Vec<&'static str> {
        let mut langs: Vec<&'static str> = STOPWORDS.keys().copied().collect();
        langs.sort_unstable();
        langs
    }
}
