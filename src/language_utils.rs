use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// The filtering pipeline keys its stopword tables and dictionary lookups by
/// ISO 639-1 (2-letter) codes. These helpers validate incoming codes,
/// normalize the 639-2/B legacy spellings that still show up in subtitle
/// metadata, and compare codes across the two families.
/// ISO 639-2/B codes whose 639-2/T spelling differs
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"), // French
    ("ger", "deu"), // German
    ("dut", "nld"), // Dutch
    ("gre", "ell"), // Greek
    ("chi", "zho"), // Chinese
    ("cze", "ces"), // Czech
    ("ice", "isl"), // Icelandic
    ("alb", "sqi"), // Albanian
    ("arm", "hye"), // Armenian
    ("baq", "eus"), // Basque
    ("bur", "mya"), // Burmese
    ("per", "fas"), // Persian
    ("geo", "kat"), // Georgian
    ("may", "msa"), // Malay
    ("mac", "mkd"), // Macedonian
    ("rum", "ron"), // Romanian
    ("slo", "slk"), // Slovak
    ("wel", "cym"), // Welsh
];

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    PART2B_TO_PART2T
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Check that a string is a valid ISO 639-1 or ISO 639-2 language code
pub fn validate_language_code(code: &str) -> Result<()> {
    let normalized = code.trim().to_lowercase();

    let valid = match normalized.len() {
        2 => Language::from_639_1(&normalized).is_some(),
        3 => Language::from_639_3(&normalized).is_some() || part2b_to_part2t(&normalized).is_some(),
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(anyhow!("Invalid language code: {}", code))
    }
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible,
/// falling back to ISO 639-2/T when no 2-letter code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let normalized = code.trim().to_lowercase();

    if normalized.len() == 2 {
        if Language::from_639_1(&normalized).is_some() {
            return Ok(normalized);
        }
    } else if normalized.len() == 3 {
        let part2t = part2b_to_part2t(&normalized).unwrap_or(&normalized);
        if let Some(lang) = Language::from_639_3(part2t) {
            if let Some(code_639_1) = lang.to_639_1() {
                return Ok(code_639_1.to_string());
            }
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (
        normalize_to_part1_or_part2t(code1),
        normalize_to_part1_or_part2t(code2),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = code.trim().to_lowercase();

    let lang = if normalized.len() == 2 {
        Language::from_639_1(&normalized)
    } else {
        let part2t = part2b_to_part2t(&normalized).unwrap_or(&normalized);
        Language::from_639_3(part2t)
    };

    lang.map(|l| l.to_name().to_string())
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))
}
