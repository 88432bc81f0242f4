//! SRT timeline parser
//!
//! Turns SubRip text into [`TimedEntry`] values. Malformed blocks are dropped
//! with a diagnostic; only an empty input or a file with no valid block at all
//! is an error.

use super::{SkipReason, SkippedBlock, TimedEntry, Timeline};
use crate::error::{Error, Result};
use regex::Regex;
use srtmix_common::time::parse_srt_timestamp;
use std::sync::OnceLock;
use tracing::{debug, warn};

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{2}:\d{2}:\d{2},\d{3}) --> (\d{2}:\d{2}:\d{2},\d{3})")
            .expect("timestamp pattern is a valid regex")
    })
}

/// Parse SRT text into a timeline.
///
/// # Errors
/// - [`Error::EmptyTimeline`] if the text is empty or whitespace only
/// - [`Error::InvalidTimeline`] if no block yields a valid entry
pub fn parse_srt(content: &str) -> Result<Timeline> {
    let content = content.trim_start_matches('\u{feff}').replace('\r', "");
    if content.trim().is_empty() {
        return Err(Error::EmptyTimeline);
    }

    let mut timeline = Timeline::default();

    for (position, block) in split_blocks(&content).into_iter().enumerate() {
        let index = position + 1;
        match parse_block(&block) {
            Ok(entry) => timeline.entries.push(entry),
            Err(reason) => {
                warn!(index, %reason, "Skipping invalid timeline block");
                timeline.skipped.push(SkippedBlock { index, reason });
            }
        }
    }

    debug!(
        entries = timeline.entries.len(),
        skipped = timeline.skipped.len(),
        "Parsed timeline"
    );

    if timeline.entries.is_empty() {
        return Err(Error::InvalidTimeline);
    }

    Ok(timeline)
}

/// Group lines into blocks separated by one or more blank lines.
fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_block(lines: &[&str]) -> std::result::Result<TimedEntry, SkipReason> {
    if lines.len() < 2 {
        return Err(SkipReason::TooFewLines);
    }

    let id_line = lines[0].trim();
    let id: u32 = id_line
        .parse()
        .map_err(|_| SkipReason::InvalidId(id_line.to_string()))?;

    let captures = timestamp_pattern()
        .captures(lines[1])
        .ok_or(SkipReason::MissingTimestamps)?;
    let start_time = parse_srt_timestamp(&captures[1]).ok_or(SkipReason::MissingTimestamps)?;
    let end_time = parse_srt_timestamp(&captures[2]).ok_or(SkipReason::MissingTimestamps)?;

    if end_time <= start_time {
        return Err(SkipReason::EndNotAfterStart);
    }

    let text = lines[2..].join(" ").trim().to_string();
    if text.is_empty() {
        return Err(SkipReason::EmptyText);
    }

    Ok(TimedEntry {
        id,
        start_time,
        end_time,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:00,000 --> 00:00:02,000\nHello there\n\n2\n00:00:02,000 --> 00:00:05,500\nSecond line\ncontinues here\n";

    #[test]
    fn test_parse_basic_blocks() {
        let timeline = parse_srt(SAMPLE).unwrap();
        assert_eq!(timeline.len(), 2);
        assert!(timeline.skipped.is_empty());

        let first = &timeline.entries[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.start_time, 0.0);
        assert_eq!(first.end_time, 2.0);
        assert_eq!(first.text, "Hello there");

        let second = &timeline.entries[1];
        assert_eq!(second.id, 2);
        assert_eq!(second.end_time, 5.5);
        assert_eq!(second.text, "Second line continues here");
    }

    #[test]
    fn test_crlf_and_bom_are_tolerated() {
        let content = format!("\u{feff}{}", SAMPLE.replace('\n', "\r\n"));
        let timeline = parse_srt(&content).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.entries[0].text, "Hello there");
    }

    #[test]
    fn test_extra_blank_lines_between_blocks() {
        let content = "1\n00:00:00,000 --> 00:00:01,000\nA\n\n\n\n2\n00:00:01,000 --> 00:00:02,000\nB\n";
        let timeline = parse_srt(content).unwrap();
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_malformed_blocks_are_skipped() {
        let content = "\
x\n00:00:00,000 --> 00:00:01,000\nbad id\n\n\
2\nnot a timestamp\nbad time\n\n\
3\n00:00:03,000 --> 00:00:04,000\n\n\
4\n00:00:05,000 --> 00:00:04,000\nbackwards\n\n\
5\n00:00:06,000 --> 00:00:07,000\ngood\n\n\
6\n";
        let timeline = parse_srt(content).unwrap();

        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.entries[0].id, 5);

        let reasons: Vec<_> = timeline.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::InvalidId("x".to_string()),
                SkipReason::MissingTimestamps,
                SkipReason::EmptyText,
                SkipReason::EndNotAfterStart,
                SkipReason::TooFewLines,
            ]
        );
    }

    #[test]
    fn test_empty_text_block_is_dropped() {
        let content = "1\n00:00:00,000 --> 00:00:01,000\n   \t\n2\n00:00:01,000 --> 00:00:02,000\nkept\n";
        // The whitespace-only line acts as a block separator, so block 1 has no text.
        let timeline = parse_srt(content).unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.entries[0].id, 2);
        assert_eq!(timeline.skipped[0].reason, SkipReason::EmptyText);
    }

    #[test]
    fn test_empty_input_is_distinct_from_no_valid_entries() {
        assert!(matches!(parse_srt(""), Err(Error::EmptyTimeline)));
        assert!(matches!(parse_srt("  \n\n "), Err(Error::EmptyTimeline)));
        assert!(matches!(
            parse_srt("garbage\nmore garbage\n"),
            Err(Error::InvalidTimeline)
        ));
    }

    #[test]
    fn test_non_contiguous_ids_keep_file_order() {
        let content = "10\n00:00:05,000 --> 00:00:06,000\nlater\n\n3\n00:00:01,000 --> 00:00:02,000\nearlier\n";
        let timeline = parse_srt(content).unwrap();
        let ids: Vec<u32> = timeline.entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![10, 3]);
    }

    #[test]
    fn test_timestamp_with_trailing_position_data() {
        let content = "1\n00:00:01,250 --> 00:00:02,750 X1:100 X2:200\ntext\n";
        let timeline = parse_srt(content).unwrap();
        assert_eq!(timeline.entries[0].start_time, 1.25);
        assert_eq!(timeline.entries[0].end_time, 2.75);
    }
}
