//! Pairs timeline entries with clips by id

use super::TimedEntry;
use crate::clips::ClipSource;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A timeline entry together with the clip that fills it
#[derive(Debug, Clone)]
pub struct MatchedPair {
    pub entry: TimedEntry,
    pub clip: Arc<ClipSource>,
}

/// Outcome of matching a timeline against a clip library
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// Entries with a clip, in timeline order
    pub matched: Vec<MatchedPair>,
    /// Entries with no clip of the same id, in timeline order
    pub missing: Vec<TimedEntry>,
}

impl MatchResult {
    /// Total number of entries classified
    pub fn total(&self) -> usize {
        self.matched.len() + self.missing.len()
    }

    /// Fail unless at least one entry was matched.
    ///
    /// An empty entry list is reported as [`Error::InvalidTimeline`]; entries
    /// with no matching clip at all as [`Error::NoMatchingClips`].
    pub fn require_matches(self) -> Result<Self> {
        if self.total() == 0 {
            return Err(Error::InvalidTimeline);
        }
        if self.matched.is_empty() {
            return Err(Error::NoMatchingClips);
        }
        Ok(self)
    }
}

/// Classify every entry as matched or missing.
///
/// A clip may serve several entries that share its id.
pub fn match_clips(entries: &[TimedEntry], clips: &BTreeMap<u32, Arc<ClipSource>>) -> MatchResult {
    let mut result = MatchResult::default();

    for entry in entries {
        match clips.get(&entry.id) {
            Some(clip) => {
                debug!(clip_id = entry.id, file_name = %clip.file_name, "Matched timeline entry");
                result.matched.push(MatchedPair {
                    entry: entry.clone(),
                    clip: Arc::clone(clip),
                });
            }
            None => {
                debug!(clip_id = entry.id, "No clip for timeline entry");
                result.missing.push(entry.clone());
            }
        }
    }

    info!(
        matched = result.matched.len(),
        missing = result.missing.len(),
        "Clip matching complete"
    );

    result
}
