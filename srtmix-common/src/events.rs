//! Render event types
//!
//! Events flow one way, from the render worker to whoever submitted the render.
//! They are the only channel back to the caller while a render runs; the final
//! output and report are delivered separately when the render finishes.
//!
//! Events are serializable so a front end can forward them as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Render lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RenderEvent {
    /// Render accepted by the worker
    RenderStarted {
        /// Render identifier
        render_id: Uuid,
        /// Number of timeline entries
        entry_count: usize,
        /// Number of supplied clips
        clip_count: usize,
        /// When the render started
        timestamp: DateTime<Utc>,
    },

    /// Progress milestone reached
    ///
    /// `percent` never decreases within one render.
    Progress {
        /// Render identifier
        render_id: Uuid,
        /// Human-readable stage label
        message: String,
        /// Completion percentage, 0.0 - 100.0
        percent: f64,
        /// When the milestone was reached
        timestamp: DateTime<Utc>,
    },

    /// A single clip failed and was left out of the mix
    ClipFailed {
        /// Render identifier
        render_id: Uuid,
        /// Clip identifier (timeline entry id)
        source_id: u32,
        /// Failure description
        message: String,
        /// When the failure was recorded
        timestamp: DateTime<Utc>,
    },

    /// Render produced output
    RenderCompleted {
        /// Render identifier
        render_id: Uuid,
        /// Size of the encoded output
        output_bytes: usize,
        /// Number of clips in the mix
        merged_tracks: usize,
        /// When the render completed
        timestamp: DateTime<Utc>,
    },

    /// Render aborted with a fatal error
    RenderFailed {
        /// Render identifier
        render_id: Uuid,
        /// Failure description
        message: String,
        /// When the render failed
        timestamp: DateTime<Utc>,
    },
}

impl RenderEvent {
    /// Render this event belongs to
    pub fn render_id(&self) -> Uuid {
        match self {
            RenderEvent::RenderStarted { render_id, .. }
            | RenderEvent::Progress { render_id, .. }
            | RenderEvent::ClipFailed { render_id, .. }
            | RenderEvent::RenderCompleted { render_id, .. }
            | RenderEvent::RenderFailed { render_id, .. } => *render_id,
        }
    }

    /// Whether no further events follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RenderEvent::RenderCompleted { .. } | RenderEvent::RenderFailed { .. }
        )
    }
}
