//! Background render service
//!
//! Renders run on tokio's blocking pool so a caller on an async runtime stays
//! responsive. Progress reaches the caller only through the event channel of
//! the returned [`RenderHandle`]; the output and report arrive once, when the
//! handle is awaited.

use super::engine::run_render;
use super::{RenderFailure, RenderOutput, RenderRequest};
use crate::encoder::{EncoderFactory, LameFactory};
use crate::error::Error;
use crate::progress::ProgressTracker;
use crate::report::ProcessReport;
use srtmix_common::events::RenderEvent;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Submits renders to the blocking pool
#[derive(Debug, Clone, Default)]
pub struct RenderService<F = LameFactory> {
    factory: F,
}

impl RenderService<LameFactory> {
    /// Service encoding with LAME
    pub fn new() -> Self {
        Self {
            factory: LameFactory,
        }
    }
}

impl<F: EncoderFactory + Clone> RenderService<F> {
    /// Service using a custom encoder factory
    pub fn with_factory(factory: F) -> Self {
        Self { factory }
    }

    /// Start a render in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, request: RenderRequest, cancel: Option<CancellationToken>) -> RenderHandle {
        let render_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let factory = self.factory.clone();

        info!(
            %render_id,
            clips = request.clips.len(),
            "Submitting render"
        );

        let task = tokio::task::spawn_blocking(move || {
            let mut tracker = ProgressTracker::new(render_id, tx);
            run_render(request, factory, &mut tracker, cancel.as_ref())
        });

        RenderHandle {
            render_id,
            events: rx,
            task,
        }
    }
}

/// A running render
pub struct RenderHandle {
    render_id: Uuid,
    /// Progress and lifecycle events; closes when the render ends
    pub events: UnboundedReceiver<RenderEvent>,
    task: JoinHandle<Result<RenderOutput, RenderFailure>>,
}

impl RenderHandle {
    pub fn render_id(&self) -> Uuid {
        self.render_id
    }

    /// Next event, or `None` once the render has finished and all events
    /// were received
    pub async fn next_event(&mut self) -> Option<RenderEvent> {
        self.events.recv().await
    }

    /// Wait for the render to finish
    pub async fn wait(self) -> Result<RenderOutput, RenderFailure> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                let error = Error::TaskFailed(e.to_string());
                let mut report = ProcessReport::new();
                report.errors.push(error.to_string());
                Err(RenderFailure { error, report })
            }
        }
    }

    /// Receive every remaining event, then wait for the result
    pub async fn collect(mut self) -> (Vec<RenderEvent>, Result<RenderOutput, RenderFailure>) {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        (events, self.wait().await)
    }
}
