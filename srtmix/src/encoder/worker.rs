//! Encoder worker thread
//!
//! An [`EncoderSession`] owns one worker thread for the length of a render.
//! The worker is started (and the encoding engine probed) when the render
//! begins, takes [`EncodeRequest`]s over a channel, and answers with a stream
//! of [`EncodeResponse`]s. Dropping the session closes the request channel and
//! joins the thread, whether the render succeeded or not.

use super::{encode_pcm, EncoderFactory};
use crate::error::{Error, Result};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Work item for the encoder worker
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    /// Planar PCM, one or two channels of equal length
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

/// Messages from the encoder worker
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeResponse {
    /// Share of the request encoded so far, in percent
    Progress(f64),
    /// Complete encoded output
    Finished(Vec<u8>),
    /// The encoder could not be configured for this request
    InitFailed(String),
    /// Encoding a frame or flushing failed
    Failed(String),
    /// The render was cancelled mid-encode
    Cancelled,
}

/// Handle to a running encoder worker
pub struct EncoderSession {
    requests: Option<Sender<EncodeRequest>>,
    responses: Receiver<EncodeResponse>,
    worker: Option<JoinHandle<()>>,
}

impl EncoderSession {
    /// Spawn the worker and wait until the encoding engine is usable.
    ///
    /// # Errors
    /// - [`Error::EncoderInit`] if the engine probe fails
    /// - [`Error::EncoderUnavailable`] if the thread cannot be started
    pub fn start<F: EncoderFactory>(factory: F, cancel: Option<CancellationToken>) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<EncodeRequest>();
        let (response_tx, response_rx) = mpsc::channel::<EncodeResponse>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let worker = std::thread::Builder::new()
            .name("srtmix-encoder".to_string())
            .spawn(move || {
                let probe = factory.probe();
                let ready = probe.is_ok();
                let _ = ready_tx.send(probe);
                if ready {
                    run_worker(&factory, cancel.as_ref(), request_rx, response_tx);
                }
            })
            .map_err(|e| Error::EncoderUnavailable(format!("Failed to spawn encoder thread: {}", e)))?;

        let mut session = Self {
            requests: Some(request_tx),
            responses: response_rx,
            worker: Some(worker),
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {
                debug!("Encoder worker ready");
                Ok(session)
            }
            Ok(Err(e)) => {
                session.shutdown();
                Err(e)
            }
            Err(_) => {
                session.shutdown();
                Err(Error::EncoderUnavailable(
                    "Encoder worker exited during startup".to_string(),
                ))
            }
        }
    }

    /// Encode one request, forwarding worker progress to `on_progress`
    pub fn encode(
        &mut self,
        request: EncodeRequest,
        mut on_progress: impl FnMut(f64),
    ) -> Result<Vec<u8>> {
        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| Error::EncoderUnavailable("Encoder session is closed".to_string()))?;
        requests
            .send(request)
            .map_err(|_| Error::EncoderUnavailable("Encoder worker is not running".to_string()))?;

        loop {
            match self.responses.recv() {
                Ok(EncodeResponse::Progress(p)) => on_progress(p),
                Ok(EncodeResponse::Finished(bytes)) => return Ok(bytes),
                Ok(EncodeResponse::InitFailed(message)) => return Err(Error::EncoderInit(message)),
                Ok(EncodeResponse::Failed(message)) => return Err(Error::Encode(message)),
                Ok(EncodeResponse::Cancelled) => return Err(Error::Cancelled),
                Err(_) => {
                    return Err(Error::EncoderUnavailable(
                        "Encoder worker stopped responding".to_string(),
                    ))
                }
            }
        }
    }

    fn shutdown(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Encoder worker panicked");
            }
        }
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        self.shutdown();
        debug!("Encoder worker released");
    }
}

fn run_worker<F: EncoderFactory>(
    factory: &F,
    cancel: Option<&CancellationToken>,
    requests: Receiver<EncodeRequest>,
    responses: Sender<EncodeResponse>,
) {
    while let Ok(request) = requests.recv() {
        let response = handle_request(factory, cancel, request, &responses);
        if responses.send(response).is_err() {
            break;
        }
    }
}

fn handle_request<F: EncoderFactory>(
    factory: &F,
    cancel: Option<&CancellationToken>,
    request: EncodeRequest,
    responses: &Sender<EncodeResponse>,
) -> EncodeResponse {
    let mut encoder = match factory.create(request.channels.len(), request.sample_rate) {
        Ok(encoder) => encoder,
        Err(e) => return EncodeResponse::InitFailed(e.to_string()),
    };

    // Forward whole-percent steps only
    let mut last_step = -1i64;
    let result = encode_pcm(encoder.as_mut(), &request.channels, cancel, |p| {
        let step = p.floor() as i64;
        if step > last_step {
            last_step = step;
            let _ = responses.send(EncodeResponse::Progress(p));
        }
    });

    match result {
        Ok(bytes) => EncodeResponse::Finished(bytes),
        Err(Error::Cancelled) => EncodeResponse::Cancelled,
        Err(e) => EncodeResponse::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::testing::RecordingFactory;
    use crate::encoder::FRAME_SIZE;

    fn request(frames: usize, channels: usize) -> EncodeRequest {
        EncodeRequest {
            channels: vec![vec![0.1; frames]; channels],
            sample_rate: 44100,
        }
    }

    #[test]
    fn test_session_encodes_and_reports_progress() {
        let factory = RecordingFactory::default();
        let frames = factory.frames.clone();
        let mut session = EncoderSession::start(factory, None).unwrap();

        let mut progress = Vec::new();
        let bytes = session
            .encode(request(FRAME_SIZE * 4, 2), |p| progress.push(p))
            .unwrap();

        assert_eq!(frames.lock().unwrap().len(), 4);
        assert_eq!(bytes.len(), 4 * 4 + 2);
        assert_eq!(progress, vec![25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_session_serves_several_requests() {
        let mut session = EncoderSession::start(RecordingFactory::default(), None).unwrap();
        assert!(session.encode(request(10, 1), |_| {}).is_ok());
        assert!(session.encode(request(10, 2), |_| {}).is_ok());
    }

    #[test]
    fn test_probe_failure_is_init_error() {
        let factory = RecordingFactory {
            fail_probe: true,
            ..Default::default()
        };
        let result = EncoderSession::start(factory, None);
        assert!(matches!(result, Err(Error::EncoderInit(_))));
    }

    #[test]
    fn test_create_failure_is_init_error() {
        let factory = RecordingFactory {
            fail_create: true,
            ..Default::default()
        };
        let mut session = EncoderSession::start(factory, None).unwrap();
        let result = session.encode(request(10, 2), |_| {});
        assert!(matches!(result, Err(Error::EncoderInit(_))));
    }

    #[test]
    fn test_cancelled_encode() {
        let token = CancellationToken::new();
        let mut session = EncoderSession::start(RecordingFactory::default(), Some(token.clone())).unwrap();
        token.cancel();
        let result = session.encode(request(FRAME_SIZE * 2, 2), |_| {});
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_drop_joins_worker() {
        let factory = RecordingFactory::default();
        let frames = factory.frames.clone();
        {
            let mut session = EncoderSession::start(factory, None).unwrap();
            session.encode(request(10, 1), |_| {}).unwrap();
        }
        // The worker (and its factory clone) are gone once the session drops
        assert_eq!(std::sync::Arc::strong_count(&frames), 1);
    }
}
