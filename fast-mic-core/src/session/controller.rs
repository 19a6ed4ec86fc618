use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::CaptureConfig;
use crate::models::error::CaptureError;
use crate::models::session::{CaptureDiagnostics, SessionInfo};
use crate::models::state::CaptureState;
use crate::processing::sample_buffer::SampleBuffer;
use crate::session::worker::{CaptureWorker, WorkerContext, WorkerExit};
use crate::traits::audio_source::{open_source, AudioBackend, AudioSource};
use crate::traits::capture_delegate::CaptureDelegate;

/// Lifecycle surface for microphone capture: `start`, `poll`, `stop`.
///
/// Data flow:
/// ```text
/// [AudioSource] → read → [CaptureWorker thread] → append → [SampleBuffer]
///                                                               ↓ drain_all
///                                                       poll() caller
/// ```
///
/// `start` and `stop` take `&mut self`; callers serialize them. `poll` only
/// takes the buffer's lock, and [`sample_buffer`](Self::sample_buffer) hands
/// out the same buffer for consumers on other threads.
pub struct CaptureController<B: AudioBackend> {
    backend: B,
    config: CaptureConfig,
    state: CaptureState,
    buffer: Arc<SampleBuffer>,
    diagnostics: Arc<Mutex<CaptureDiagnostics>>,
    worker: Option<CaptureWorker<B::Source>>,
    session: Option<SessionInfo>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
}

impl<B: AudioBackend> CaptureController<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, CaptureConfig::default())
    }

    pub fn with_config(backend: B, config: CaptureConfig) -> Self {
        Self {
            backend,
            config,
            state: CaptureState::Idle,
            buffer: Arc::new(SampleBuffer::new()),
            diagnostics: Arc::new(Mutex::new(CaptureDiagnostics::default())),
            worker: None,
            session: None,
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// The current session, if recording.
    pub fn session(&self) -> Option<&SessionInfo> {
        self.session.as_ref()
    }

    /// Session counters. `samples_polled` counts every drain of the sample
    /// buffer, including drains through [`sample_buffer`](Self::sample_buffer).
    pub fn diagnostics(&self) -> CaptureDiagnostics {
        let mut diagnostics = self.diagnostics.lock().clone();
        diagnostics.samples_polled = self.buffer.total_drained();
        diagnostics
    }

    /// Shared handle to the sample buffer.
    pub fn sample_buffer(&self) -> Arc<SampleBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Whether a capture thread is currently reading the device.
    ///
    /// False while Recording means the worker died on a device error.
    pub fn is_worker_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Start a capture session. Transitions: idle → recording.
    ///
    /// Discards samples left over from the previous session. On error the
    /// controller stays idle.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state.is_recording() {
            return Err(CaptureError::InvalidState("already recording".into()));
        }

        self.buffer.clear();

        let mut source = open_source(&self.backend, &self.config)?;
        let scratch_size = self.config.scratch_size(source.min_buffer_size());

        if let Err(e) = source.start_streaming() {
            if let Err(close_err) = source.close() {
                log::warn!("Failed to close source after start error: {}", close_err);
            }
            return Err(e);
        }

        *self.diagnostics.lock() = CaptureDiagnostics::default();

        let worker = CaptureWorker::spawn(
            source,
            WorkerContext {
                buffer: Arc::clone(&self.buffer),
                diagnostics: Arc::clone(&self.diagnostics),
                delegate: self.delegate.clone(),
                scratch_size,
            },
        )?;

        let session = SessionInfo::new(&self.config, scratch_size);
        log::info!(
            "Recording started: session {}, {} Hz, buffer size {}",
            session.id,
            session.sample_rate,
            scratch_size
        );

        self.worker = Some(worker);
        self.session = Some(session);
        self.set_state(CaptureState::Recording);
        Ok(())
    }

    /// Remove and return every sample captured since the last poll.
    ///
    /// Legal in any state; returns an empty vector when nothing is buffered.
    pub fn poll(&self) -> Vec<i16> {
        self.buffer.drain_all()
    }

    /// Stop the capture session. Transitions: recording → idle.
    ///
    /// A no-op when idle. Joins the capture thread before returning, so no
    /// sample is appended after this call. Samples still buffered stay
    /// available to `poll`; samples not yet read from the device are dropped.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        let Some(worker) = self.worker.take() else {
            log::debug!("Stop requested while idle");
            return Ok(());
        };

        log::info!("Stopping recorder");

        match worker.join() {
            Ok((mut source, exit)) => {
                if let WorkerExit::Failed(e) = exit {
                    log::warn!("Capture worker had already stopped: {}", e);
                }
                if let Err(e) = source.stop_streaming() {
                    log::warn!("Failed to stop stream: {}", e);
                }
                if let Err(e) = source.close() {
                    log::warn!("Failed to close source: {}", e);
                }
            }
            Err(e) => log::error!("Capture worker lost: {}", e),
        }

        if let Some(session) = self.session.take() {
            log::info!(
                "Recording stopped: session {}, {} samples captured",
                session.id,
                self.diagnostics.lock().samples_captured
            );
        }
        self.set_state(CaptureState::Idle);
        Ok(())
    }

    fn set_state(&mut self, state: CaptureState) {
        self.state = state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(state);
        }
    }
}

impl<B: AudioBackend> Drop for CaptureController<B> {
    fn drop(&mut self) {
        if self.state.is_recording() {
            let _ = self.stop();
        }
    }
}
