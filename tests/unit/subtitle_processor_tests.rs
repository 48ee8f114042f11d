/*!
 * Parsing and serialization tests beyond the inline module coverage.
 */

use lexisub::subtitle_processor::{SegmentWarning, TimedSegment, TimedTextParser};

use crate::common;

#[test]
fn test_parse_multilineText_shouldJoinWithNewline() {
    common::init_logging();
    let input = "1\n00:00:01,000 --> 00:00:04,000\nErste Zeile\nZweite Zeile\n";

    let segments = TimedTextParser::parse(input).unwrap();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text, "Erste Zeile\nZweite Zeile");
}

#[test]
fn test_parse_unorderedBlocks_shouldSortAndRenumber() {
    common::init_logging();
    let input = "7\n00:00:10,000 --> 00:00:12,000\nSpäter\n\n3\n00:00:01,000 --> 00:00:03,000\nFrüher\n";

    let segments = TimedTextParser::parse(input).unwrap();

    assert_eq!(segments[0].index, 1);
    assert_eq!(segments[0].text, "Früher");
    assert_eq!(segments[1].index, 2);
    assert_eq!(segments[1].text, "Später");
}

#[test]
fn test_parse_fixture_shouldYieldThreeSegments() {
    common::init_logging();
    let segments = TimedTextParser::parse(common::GERMAN_FIXTURE).unwrap();

    assert_eq!(segments.len(), 3);
    assert!(TimedTextParser::validate(&segments).is_empty());
}

#[test]
fn test_serialize_shouldEmitFixedWidthTimestamps() {
    let segments = vec![TimedSegment::new(1, 61_500, 63_250, "Hallo".to_string())];

    let output = TimedTextParser::serialize(&segments);

    assert!(output.contains("00:01:01,500 --> 00:01:03,250"));
    assert!(output.ends_with("\n\n"));
}

#[test]
fn test_validate_nonPositiveDuration_shouldWarn() {
    let mut segment = TimedSegment::new(1, 2000, 3000, "Hallo".to_string());
    segment.end_time_ms = 2000;

    let warnings = TimedTextParser::validate(&[segment]);

    assert!(warnings
        .iter()
        .any(|w| matches!(w, SegmentWarning::NonPositiveDuration { index: 1 })));
}

#[test]
fn test_validate_emptyText_shouldWarn() {
    let mut segment = TimedSegment::new(1, 1000, 2000, "x".to_string());
    segment.text = "   ".to_string();

    let warnings = TimedTextParser::validate(&[segment]);

    assert!(warnings.iter().any(|w| matches!(w, SegmentWarning::EmptyText { index: 1 })));
}
