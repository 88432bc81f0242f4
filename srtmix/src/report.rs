//! Processing report
//!
//! Returned with every render, successful or not. A successful render whose
//! report lists missing entries or clip errors is a success with warnings.

use crate::timeline::TimedEntry;
use serde::{Deserialize, Serialize};
use srtmix_common::time::format_duration;
use std::path::Path;

/// Output container name recorded in every report
pub const OUTPUT_FORMAT: &str = "mp3";

/// One clip that made it into the mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedTrackInfo {
    /// Timeline entry id the clip was matched to
    pub source_id: u32,
    pub file_name: String,
    /// Placement on the timeline, seconds
    pub start_time: f64,
    /// Length of the timeline span, seconds
    pub original_duration: f64,
    /// Span length divided by the playback rate (estimate)
    pub scheduled_duration: f64,
}

impl MergedTrackInfo {
    /// Estimated end on the timeline
    pub fn scheduled_end(&self) -> f64 {
        self.start_time + self.scheduled_duration
    }
}

/// Summary of one render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReport {
    pub merged_tracks: Vec<MergedTrackInfo>,
    /// Timeline entries that had no matching clip
    pub missing_files: Vec<TimedEntry>,
    /// Per-clip failures (`"<file>: <message>"`) and, on failure, the fatal error
    pub errors: Vec<String>,
    /// Estimated timeline length: latest scheduled end over merged tracks
    pub total_duration: f64,
    /// Exact length of the rendered master buffer, seconds
    pub rendered_duration: f64,
    pub output_format: String,
}

impl Default for ProcessReport {
    fn default() -> Self {
        Self {
            merged_tracks: Vec::new(),
            missing_files: Vec::new(),
            errors: Vec::new(),
            total_duration: 0.0,
            rendered_duration: 0.0,
            output_format: OUTPUT_FORMAT.to_string(),
        }
    }
}

impl ProcessReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a merged clip and extend the estimated total duration
    pub fn add_merged(&mut self, info: MergedTrackInfo) {
        self.total_duration = self.total_duration.max(info.scheduled_end());
        self.merged_tracks.push(info);
    }

    /// Record a clip failure as `"<file>: <message>"`
    pub fn add_clip_error(&mut self, file_name: &str, message: impl std::fmt::Display) {
        self.errors.push(format!("{}: {}", file_name, message));
    }

    /// Whether the render succeeded with missing entries or clip errors
    pub fn has_warnings(&self) -> bool {
        !self.missing_files.is_empty() || !self.errors.is_empty()
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report as JSON to `path`
    pub fn write_json(&self, path: &Path) -> crate::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let missing: Vec<String> = self.missing_files.iter().map(|e| e.id.to_string()).collect();
        format!(
            "{} merged, {} missing{}, {} errors, estimated {} / rendered {}",
            self.merged_tracks.len(),
            self.missing_files.len(),
            if missing.is_empty() {
                String::new()
            } else {
                format!(" (ids {})", missing.join(", "))
            },
            self.errors.len(),
            format_duration(self.total_duration),
            format_duration(self.rendered_duration),
        )
    }
}
