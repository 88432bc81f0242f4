//! Timeline model, SRT parsing, and clip matching

pub mod matcher;
pub mod parser;

pub use matcher::{match_clips, MatchResult, MatchedPair};
pub use parser::parse_srt;

use serde::{Deserialize, Serialize};

/// One timed span on the output timeline.
///
/// Invariants (enforced by the parser): `end_time > start_time >= 0` and
/// `text` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedEntry {
    /// Entry identifier; matched against clip ids
    pub id: u32,
    /// Start of the span in seconds
    pub start_time: f64,
    /// End of the span in seconds
    pub end_time: f64,
    /// Subtitle text
    pub text: String,
}

impl TimedEntry {
    /// Length of the span in seconds
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Why a timeline block was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than two lines
    TooFewLines,
    /// First line is not an unsigned integer
    InvalidId(String),
    /// Second line has no `start --> end` timestamp pair
    MissingTimestamps,
    /// End timestamp is not after the start timestamp
    EndNotAfterStart,
    /// No subtitle text after the timestamp line
    EmptyText,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TooFewLines => write!(f, "block has fewer than two lines"),
            SkipReason::InvalidId(line) => write!(f, "invalid id line '{}'", line),
            SkipReason::MissingTimestamps => write!(f, "no 'HH:MM:SS,mmm --> HH:MM:SS,mmm' line"),
            SkipReason::EndNotAfterStart => write!(f, "end time is not after start time"),
            SkipReason::EmptyText => write!(f, "block has no text"),
        }
    }
}

/// Diagnostic for a block the parser dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBlock {
    /// 1-based position of the block in the file
    pub index: usize,
    /// Why it was dropped
    pub reason: SkipReason,
}

/// Parsed timeline: valid entries in file order plus parse diagnostics
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    /// Valid entries, in file order
    pub entries: Vec<TimedEntry>,
    /// Blocks that were dropped
    pub skipped: Vec<SkippedBlock>,
}

impl Timeline {
    /// Number of valid entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no valid entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
