use std::fmt;

use anyhow::{Result, anyhow};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// @module: Time-coded text parsing and serialization

// @const: SRT timestamp line regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

/// Delimiter between original text and translation inside a dual-language line
const DUAL_LANGUAGE_DELIMITER: char = '|';

/// A single time-coded segment of transcript text.
///
/// Times are stored as integer milliseconds so that serialization round-trips
/// exactly; a seconds view is exposed through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedSegment {
    /// 1-based sequential index
    pub index: usize,

    /// Start time in ms
    pub start_time_ms: u64,

    /// End time in ms
    pub end_time_ms: u64,

    /// Original-language text used for classification
    pub text: String,

    /// The original line as parsed (before any later rewriting)
    pub original_text: String,

    /// Translation, empty until filled by a translator pass
    #[serde(default)]
    pub translation: String,
}

impl TimedSegment {
    /// Creates a new segment with no translation
    pub fn new(index: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        TimedSegment {
            index,
            start_time_ms,
            end_time_ms,
            original_text: text.clone(),
            text,
            translation: String::new(),
        }
    }

    // @creates: Validated segment
    // @validates: Time range and non-empty text
    pub fn new_validated(
        index: usize,
        start_time_ms: u64,
        end_time_ms: u64,
        text: String,
    ) -> Result<Self> {
        if end_time_ms <= start_time_ms {
            return Err(anyhow!(
                "Invalid time range: end time {} <= start time {}",
                end_time_ms,
                start_time_ms
            ));
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("Empty segment text for entry {}", index));
        }

        Ok(TimedSegment::new(
            index,
            start_time_ms,
            end_time_ms,
            trimmed.to_string(),
        ))
    }

    /// Start time in seconds
    pub fn start_seconds(&self) -> f64 {
        self.start_time_ms as f64 / 1000.0
    }

    /// End time in seconds
    pub fn end_seconds(&self) -> f64 {
        self.end_time_ms as f64 / 1000.0
    }

    /// Segment duration in milliseconds (0 when the range is inverted)
    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }

    /// Whether a translation has been filled in
    pub fn has_translation(&self) -> bool {
        !self.translation.is_empty()
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for TimedSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        if self.translation.is_empty() {
            writeln!(f, "{}", self.text)?;
        } else {
            writeln!(f, "{}{}{}", self.text, DUAL_LANGUAGE_DELIMITER, self.translation)?;
        }
        writeln!(f)
    }
}

/// Non-fatal structural issue found in a parsed segment list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentWarning {
    /// Two adjacent segments overlap in time
    Overlap {
        /// Index of the earlier segment
        first_index: usize,
        /// Index of the later segment
        second_index: usize,
    },
    /// A segment's duration is zero or negative
    NonPositiveDuration {
        /// Index of the offending segment
        index: usize,
    },
    /// A segment carries no text
    EmptyText {
        /// Index of the offending segment
        index: usize,
    },
}

impl fmt::Display for SegmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SegmentWarning::Overlap { first_index, second_index } => {
                write!(f, "segments {} and {} overlap in time", first_index, second_index)
            }
            SegmentWarning::NonPositiveDuration { index } => {
                write!(f, "segment {} has non-positive duration", index)
            }
            SegmentWarning::EmptyText { index } => {
                write!(f, "segment {} has empty text", index)
            }
        }
    }
}

/// Parser and serializer for time-coded text blocks.
///
/// Parsing is best-effort: malformed blocks are skipped with a warning and
/// only a fully empty result is an error. `parse(serialize(x))` reproduces
/// (index, start, end, text) for well-formed input.
pub struct TimedTextParser;

impl TimedTextParser {
    /// Parse SRT-style content into ordered segments.
    ///
    /// Blocks are separated by blank lines (LF or CRLF). A well-formed block
    /// has a numeric index line, a timestamp range line and at least one text
    /// line; anything else is skipped.
    pub fn parse(content: &str) -> Result<Vec<TimedSegment>> {
        let normalized = content.replace("\r\n", "\n");
        let mut segments = Vec::new();
        let mut skipped = 0usize;

        for block in normalized.split("\n\n") {
            let lines: Vec<&str> = block
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();

            if lines.is_empty() {
                continue;
            }

            match Self::parse_block(&lines) {
                Some(segment) => segments.push(segment),
                None => {
                    skipped += 1;
                    warn!("Skipping malformed subtitle block: {:?}", lines.first());
                }
            }
        }

        if segments.is_empty() {
            return Err(anyhow!("No valid segments were found in the input"));
        }

        if skipped > 0 {
            debug!("Skipped {} malformed block(s) while parsing", skipped);
        }

        // Sort by start time and renumber to guarantee sequential order
        segments.sort_by_key(|s| s.start_time_ms);
        for (i, segment) in segments.iter_mut().enumerate() {
            segment.index = i + 1;
        }

        Ok(segments)
    }

    /// Parse one block of trimmed, non-empty lines
    fn parse_block(lines: &[&str]) -> Option<TimedSegment> {
        if lines.len() < 3 {
            return None;
        }

        let index: usize = lines[0].parse().ok()?;

        let caps = TIMESTAMP_REGEX.captures(lines[1])?;
        let start_ms = Self::timestamp_ms(&caps, 1)?;
        let end_ms = Self::timestamp_ms(&caps, 5)?;

        let raw_text = lines[2..].join("\n");
        let (text, translation) = match raw_text.split_once(DUAL_LANGUAGE_DELIMITER) {
            Some((original, translated)) => (original.trim().to_string(), translated.trim().to_string()),
            None => (raw_text.trim().to_string(), String::new()),
        };

        let mut segment = TimedSegment::new_validated(index, start_ms, end_ms, text).ok()?;
        segment.translation = translation;
        Some(segment)
    }

    /// Read four capture groups starting at `start_idx` as a millisecond value
    fn timestamp_ms(caps: &regex::Captures, start_idx: usize) -> Option<u64> {
        let field = |i: usize| -> Option<u64> { caps.get(start_idx + i)?.as_str().parse().ok() };

        let hours = field(0)?;
        let minutes = field(1)?;
        let seconds = field(2)?;
        let millis = field(3)?;

        if minutes >= 60 || seconds >= 60 {
            return None;
        }

        Some((hours * 3600 + minutes * 60 + seconds) * 1000 + millis)
    }

    /// Serialize segments back to SRT-style text
    pub fn serialize(segments: &[TimedSegment]) -> String {
        let mut out = String::new();
        for segment in segments {
            out.push_str(&segment.to_string());
        }
        out
    }

    /// Scan a segment list for non-fatal structural issues.
    ///
    /// Warnings never fail a parse; callers surface them to logs or clients.
    pub fn validate(segments: &[TimedSegment]) -> Vec<SegmentWarning> {
        let mut warnings = Vec::new();

        for segment in segments {
            if segment.end_time_ms <= segment.start_time_ms {
                warnings.push(SegmentWarning::NonPositiveDuration { index: segment.index });
            }
            if segment.text.trim().is_empty() {
                warnings.push(SegmentWarning::EmptyText { index: segment.index });
            }
        }

        for pair in segments.windows(2) {
            if pair[0].end_time_ms > pair[1].start_time_ms {
                warnings.push(SegmentWarning::Overlap {
                    first_index: pair[0].index,
                    second_index: pair[1].index,
                });
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "1\n00:00:01,000 --> 00:00:03,500\nDer Hund läuft\n\n2\n00:00:04,000 --> 00:00:06,000\nIch bin hier\n";

    #[test]
    fn test_parse_wellFormed_shouldReturnOrderedSegments() {
        let segments = TimedTextParser::parse(WELL_FORMED).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].index, 1);
        assert_eq!(segments[0].start_time_ms, 1000);
        assert_eq!(segments[0].end_time_ms, 3500);
        assert_eq!(segments[0].text, "Der Hund läuft");
        assert_eq!(segments[1].index, 2);
    }

    #[test]
    fn test_parse_crlfSeparators_shouldParse() {
        let crlf = WELL_FORMED.replace('\n', "\r\n");
        let segments = TimedTextParser::parse(&crlf).unwrap();
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_parse_malformedBlock_shouldSkipSilently() {
        let mixed = "1\n00:00:01,000 --> 00:00:02,000\nGood line\n\nnot-a-number\n00:00:03,000 --> 00:00:04,000\nBad block\n";
        let segments = TimedTextParser::parse(mixed).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Good line");
    }

    #[test]
    fn test_parse_missingArrow_shouldSkipBlock() {
        let mixed = "1\n00:00:01,000 -> 00:00:02,000\nMissing arrow\n\n2\n00:00:03,000 --> 00:00:04,000\nGood\n";
        let segments = TimedTextParser::parse(mixed).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Good");
    }

    #[test]
    fn test_parse_allMalformed_shouldError() {
        let bad = "x\nno timestamps here\n";
        assert!(TimedTextParser::parse(bad).is_err());
    }

    #[test]
    fn test_parse_dualLanguage_shouldSplitOnPipe() {
        let dual = "1\n00:00:01,000 --> 00:00:02,000\nDer Hund läuft|The dog runs\n";
        let segments = TimedTextParser::parse(dual).unwrap();

        assert_eq!(segments[0].text, "Der Hund läuft");
        assert_eq!(segments[0].translation, "The dog runs");
    }

    #[test]
    fn test_parse_noDelimiter_shouldLeaveTranslationEmpty() {
        let segments = TimedTextParser::parse(WELL_FORMED).unwrap();
        assert!(segments.iter().all(|s| s.translation.is_empty()));
    }

    #[test]
    fn test_roundTrip_shouldReproduceSegments() {
        let original = TimedTextParser::parse(WELL_FORMED).unwrap();
        let reparsed = TimedTextParser::parse(&TimedTextParser::serialize(&original)).unwrap();

        assert_eq!(original.len(), reparsed.len());
        for (a, b) in original.iter().zip(reparsed.iter()) {
            assert_eq!(a.index, b.index);
            assert_eq!(a.start_time_ms, b.start_time_ms);
            assert_eq!(a.end_time_ms, b.end_time_ms);
            assert_eq!(a.text, b.text);
        }
    }

    #[test]
    fn test_roundTrip_dualLanguage_shouldPreserveTranslation() {
        let dual = "1\n00:00:01,000 --> 00:00:02,000\nHallo|Hello\n";
        let original = TimedTextParser::parse(dual).unwrap();
        let reparsed = TimedTextParser::parse(&TimedTextParser::serialize(&original)).unwrap();

        assert_eq!(reparsed[0].translation, "Hello");
    }

    #[test]
    fn test_validate_overlap_shouldWarnWithoutFailing() {
        let overlapping = "1\n00:00:01,000 --> 00:00:05,000\nFirst\n\n2\n00:00:04,000 --> 00:00:06,000\nSecond\n";
        let segments = TimedTextParser::parse(overlapping).unwrap();
        let warnings = TimedTextParser::validate(&segments);

        assert_eq!(segments.len(), 2);
        assert!(warnings.iter().any(|w| matches!(
            w,
            SegmentWarning::Overlap { first_index: 1, second_index: 2 }
        )));
    }

    #[test]
    fn test_validate_cleanInput_shouldReturnNoWarnings() {
        let segments = TimedTextParser::parse(WELL_FORMED).unwrap();
        assert!(TimedTextParser::validate(&segments).is_empty());
    }

    #[test]
    fn test_newValidated_invertedRange_shouldReject() {
        assert!(TimedSegment::new_validated(1, 2000, 1000, "text".to_string()).is_err());
        assert!(TimedSegment::new_validated(1, 1000, 1000, "text".to_string()).is_err());
    }

    #[test]
    fn test_formatTimestamp_shouldBeFixedWidth() {
        assert_eq!(TimedSegment::format_timestamp(3_661_042), "01:01:01,042");
        assert_eq!(TimedSegment::format_timestamp(0), "00:00:00,000");
    }

    #[test]
    fn test_secondsAccessors_shouldConvertFromMillis() {
        let segment = TimedSegment::new(1, 1500, 4250, "x".to_string());
        assert!((segment.start_seconds() - 1.5).abs() < f64::EPSILON);
        assert!((segment.end_seconds() - 4.25).abs() < f64::EPSILON);
    }
}
