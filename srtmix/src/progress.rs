//! Render progress tracking
//!
//! Maps pipeline milestones to a completion percentage and forwards them as
//! [`RenderEvent`]s. Percentages are clamped to `[0, 100]` and never go
//! backwards within one render.

use chrono::Utc;
use srtmix_common::events::RenderEvent;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use uuid::Uuid;

/// Clips matched against the timeline
pub const MATCHING_PERCENT: f64 = 5.0;
/// Encoder worker ready
pub const ENCODER_LOADED_PERCENT: f64 = 10.0;
/// Clip sources loaded
pub const CLIPS_LOADED_PERCENT: f64 = 20.0;
/// Transform plans built
pub const PLANS_BUILT_PERCENT: f64 = 30.0;
/// All clips processed and mixed
pub const MIXDOWN_PERCENT: f64 = 50.0;
/// Encoding finished
pub const COMPLETE_PERCENT: f64 = 99.0;
/// Output handed back
pub const FINISHED_PERCENT: f64 = 100.0;

/// Progress while processing clip `index` (0-based) of `total`: 30 → 50
pub fn clip_percent(index: usize, total: usize) -> f64 {
    if total == 0 {
        return MIXDOWN_PERCENT;
    }
    let done = (index + 1).min(total) as f64 / total as f64;
    PLANS_BUILT_PERCENT + (MIXDOWN_PERCENT - PLANS_BUILT_PERCENT) * done
}

/// Progress while encoding, given encoder completion `p` in percent: 50 → 99.5
pub fn encoding_percent(p: f64) -> f64 {
    MIXDOWN_PERCENT + p.clamp(0.0, 99.0) / 2.0
}

/// Per-render progress state and event sender
#[derive(Debug)]
pub struct ProgressTracker {
    render_id: Uuid,
    events: Option<UnboundedSender<RenderEvent>>,
    percent: f64,
}

impl ProgressTracker {
    /// Tracker that forwards events to `events`
    pub fn new(render_id: Uuid, events: UnboundedSender<RenderEvent>) -> Self {
        Self {
            render_id,
            events: Some(events),
            percent: 0.0,
        }
    }

    /// Tracker that only logs
    pub fn detached(render_id: Uuid) -> Self {
        Self {
            render_id,
            events: None,
            percent: 0.0,
        }
    }

    pub fn render_id(&self) -> Uuid {
        self.render_id
    }

    /// Last reported percentage
    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Report a milestone; returns the percentage actually reported
    pub fn update(&mut self, message: &str, percent: f64) -> f64 {
        let percent = if percent.is_nan() {
            self.percent
        } else {
            percent.clamp(0.0, FINISHED_PERCENT).max(self.percent)
        };
        self.percent = percent;

        debug!(render_id = %self.render_id, percent, "{}", message);
        self.send(RenderEvent::Progress {
            render_id: self.render_id,
            message: message.to_string(),
            percent,
            timestamp: Utc::now(),
        });
        percent
    }

    pub fn started(&self, entry_count: usize, clip_count: usize) {
        info!(render_id = %self.render_id, entry_count, clip_count, "Render started");
        self.send(RenderEvent::RenderStarted {
            render_id: self.render_id,
            entry_count,
            clip_count,
            timestamp: Utc::now(),
        });
    }

    pub fn clip_failed(&self, source_id: u32, message: &str) {
        self.send(RenderEvent::ClipFailed {
            render_id: self.render_id,
            source_id,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn completed(&self, output_bytes: usize, merged_tracks: usize) {
        self.send(RenderEvent::RenderCompleted {
            render_id: self.render_id,
            output_bytes,
            merged_tracks,
            timestamp: Utc::now(),
        });
    }

    pub fn failed(&self, message: &str) {
        self.send(RenderEvent::RenderFailed {
            render_id: self.render_id,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn send(&self, event: RenderEvent) {
        if let Some(events) = &self.events {
            // Receiver dropped: the caller stopped listening, the render continues
            let _ = events.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::UnboundedReceiver<RenderEvent>) -> Vec<RenderEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_clip_percent_range() {
        assert_eq!(clip_percent(0, 4), 35.0);
        assert_eq!(clip_percent(3, 4), 50.0);
        assert_eq!(clip_percent(9, 4), 50.0);
        assert_eq!(clip_percent(0, 0), 50.0);
    }

    #[test]
    fn test_encoding_percent_caps_below_complete() {
        assert_eq!(encoding_percent(0.0), 50.0);
        assert_eq!(encoding_percent(50.0), 75.0);
        assert_eq!(encoding_percent(100.0), 99.5);
        assert_eq!(encoding_percent(-5.0), 50.0);
    }

    #[test]
    fn test_percent_never_decreases() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tracker = ProgressTracker::new(Uuid::new_v4(), tx);

        assert_eq!(tracker.update("a", 20.0), 20.0);
        assert_eq!(tracker.update("b", 10.0), 20.0);
        assert_eq!(tracker.update("c", 150.0), 100.0);
        assert_eq!(tracker.update("d", f64::NAN), 100.0);

        let percents: Vec<f64> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                RenderEvent::Progress { percent, .. } => Some(percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![20.0, 20.0, 100.0, 100.0]);
    }

    #[test]
    fn test_events_carry_render_id() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let mut tracker = ProgressTracker::new(id, tx);

        tracker.started(3, 2);
        tracker.update("Matching", MATCHING_PERCENT);
        tracker.clip_failed(3, "bad");
        tracker.completed(1024, 2);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e.render_id() == id));
        assert!(events[3].is_terminal());
    }

    #[test]
    fn test_detached_and_dropped_receiver() {
        let mut detached = ProgressTracker::detached(Uuid::new_v4());
        assert_eq!(detached.update("x", 42.0), 42.0);

        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut tracker = ProgressTracker::new(Uuid::new_v4(), tx);
        assert_eq!(tracker.update("y", 5.0), 5.0);
    }
}
