//! cpal-backed microphone input.
//!
//! `cpal::Stream` is not `Send` on every host, so each `CpalSource` owns a
//! dedicated stream thread that builds, plays, pauses and finally drops the
//! stream. The audio callback converts each chunk to mono i16, applies the
//! noise gate when enabled, and sends it over a channel that `read` drains
//! with a timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, StreamTrait};
use parking_lot::Mutex;

use fast_mic_core::processing::pcm;
use fast_mic_core::{AudioBackend, AudioSource, CaptureConfig, CaptureError, NoiseGate};

use crate::device_enumerator::resolve_input_device;
use crate::permissions::check_microphone_permission;
use crate::stream_config::{select_config, ConfigCandidate, InputFormat};

/// How long `read` waits to fill its buffer before returning what it has.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Backend options chosen at construction.
#[derive(Debug, Clone)]
pub struct CpalOptions {
    /// Input device by name. `None` uses the host default.
    pub device_name: Option<String>,
    pub read_timeout: Duration,
}

impl Default for CpalOptions {
    fn default() -> Self {
        Self {
            device_name: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Opens `CpalSource`s on the default cpal host.
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    options: CpalOptions,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CpalOptions) -> Self {
        Self { options }
    }
}

impl AudioBackend for CpalBackend {
    type Source = CpalSource;

    fn open(&self, config: &CaptureConfig) -> Result<CpalSource, CaptureError> {
        if !check_microphone_permission()? {
            return Err(CaptureError::PermissionDenied);
        }
        CpalSource::open(config, &self.options)
    }
}

/// What the stream thread resolved while building the stream.
#[derive(Debug, Clone)]
struct StreamSetup {
    device_name: String,
    device_channels: u16,
    format: InputFormat,
    min_buffer_size: usize,
}

enum StreamCommand {
    Play(Sender<Result<(), CaptureError>>),
    Pause(Sender<Result<(), CaptureError>>),
    Close,
}

type Fault = Arc<Mutex<Option<CaptureError>>>;

/// An open cpal input stream delivering 48 kHz mono i16.
pub struct CpalSource {
    setup: StreamSetup,
    control_tx: Sender<StreamCommand>,
    samples: Receiver<Vec<i16>>,
    pending: Vec<i16>,
    pending_pos: usize,
    fault: Fault,
    gate_enabled: Arc<AtomicBool>,
    read_timeout: Duration,
    streaming: bool,
    stream_thread: Option<JoinHandle<()>>,
}

impl CpalSource {
    fn open(config: &CaptureConfig, options: &CpalOptions) -> Result<Self, CaptureError> {
        let (sample_tx, sample_rx) = mpsc::channel();
        let (control_tx, control_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let fault: Fault = Arc::new(Mutex::new(None));
        let gate_enabled = Arc::new(AtomicBool::new(false));

        let params = StreamParams {
            device_name: options.device_name.clone(),
            sample_rate: config.sample_rate,
            sample_tx,
            fault: Arc::clone(&fault),
            gate_enabled: Arc::clone(&gate_enabled),
        };

        let handle = thread::Builder::new()
            .name("mic-stream".into())
            .spawn(move || run_stream_thread(params, control_rx, ready_tx))
            .map_err(|e| CaptureError::Device(format!("failed to spawn stream thread: {}", e)))?;

        let setup = match ready_rx.recv() {
            Ok(Ok(setup)) => setup,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(CaptureError::device("stream thread exited during setup"));
            }
        };

        log::info!(
            "Opened input '{}' ({} ch {:?} at {} Hz, min buffer {} samples)",
            setup.device_name,
            setup.device_channels,
            setup.format,
            config.sample_rate,
            setup.min_buffer_size
        );

        Ok(Self {
            setup,
            control_tx,
            samples: sample_rx,
            pending: Vec::new(),
            pending_pos: 0,
            fault,
            gate_enabled,
            read_timeout: options.read_timeout,
            streaming: false,
            stream_thread: Some(handle),
        })
    }

    fn send_command(
        &self,
        make: impl FnOnce(Sender<Result<(), CaptureError>>) -> StreamCommand,
    ) -> Result<(), CaptureError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.control_tx
            .send(make(reply_tx))
            .map_err(|_| CaptureError::device("stream thread is gone"))?;
        reply_rx
            .recv()
            .map_err(|_| CaptureError::device("stream thread is gone"))?
    }

    fn copy_pending(&mut self, buffer: &mut [i16], written: usize) -> usize {
        let available = &self.pending[self.pending_pos..];
        let n = available.len().min(buffer.len() - written);
        buffer[written..written + n].copy_from_slice(&available[..n]);
        self.pending_pos += n;
        n
    }

    fn take_chunk(&mut self, chunk: Vec<i16>) {
        self.pending = chunk;
        self.pending_pos = 0;
    }

    fn shutdown(&mut self) -> Result<(), CaptureError> {
        let Some(handle) = self.stream_thread.take() else {
            return Ok(());
        };
        let _ = self.control_tx.send(StreamCommand::Close);
        handle
            .join()
            .map_err(|_| CaptureError::device("stream thread panicked"))
    }
}

impl AudioSource for CpalSource {
    fn min_buffer_size(&self) -> usize {
        self.setup.min_buffer_size
    }

    fn enable_noise_suppression(&mut self) -> Result<(), CaptureError> {
        self.gate_enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn start_streaming(&mut self) -> Result<(), CaptureError> {
        if self.streaming {
            return Err(CaptureError::device("stream already playing"));
        }
        self.send_command(StreamCommand::Play)?;
        self.streaming = true;
        Ok(())
    }

    fn stop_streaming(&mut self) -> Result<(), CaptureError> {
        if !self.streaming {
            return Err(CaptureError::device("stream is not playing"));
        }
        self.streaming = false;
        self.send_command(StreamCommand::Pause)
    }

    /// Fill `buffer` from the callback chunks, waiting up to the read timeout.
    ///
    /// Returns short only when the timeout expires or the stream has failed.
    /// Samples queued before a stream error are handed out first; the error
    /// is reported once nothing is left.
    fn read(&mut self, buffer: &mut [i16]) -> Result<usize, CaptureError> {
        if buffer.is_empty() {
            return Ok(0);
        }

        let deadline = Instant::now() + self.read_timeout;
        let mut written = 0;

        loop {
            written += self.copy_pending(buffer, written);
            if written == buffer.len() {
                return Ok(written);
            }

            match self.samples.try_recv() {
                Ok(chunk) => {
                    self.take_chunk(chunk);
                    continue;
                }
                Err(TryRecvError::Disconnected) => {
                    return short_read(written, CaptureError::device("input stream closed"))
                }
                Err(TryRecvError::Empty) => {}
            }

            if let Some(err) = self.fault.lock().clone() {
                return short_read(written, err);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(written);
            }
            match self.samples.recv_timeout(remaining) {
                Ok(chunk) => self.take_chunk(chunk),
                Err(RecvTimeoutError::Timeout) => return Ok(written),
                Err(RecvTimeoutError::Disconnected) => {
                    return short_read(written, CaptureError::device("input stream closed"))
                }
            }
        }
    }

    fn close(mut self) -> Result<(), CaptureError> {
        let result = self.shutdown();
        log::debug!("Closed input '{}'", self.setup.device_name);
        result
    }
}

impl Drop for CpalSource {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("Input stream shutdown failed: {}", e);
        }
    }
}

/// Hand out what was collected; report `err` only when nothing was.
fn short_read(written: usize, err: CaptureError) -> Result<usize, CaptureError> {
    if written > 0 {
        Ok(written)
    } else {
        Err(err)
    }
}

struct StreamParams {
    device_name: Option<String>,
    sample_rate: u32,
    sample_tx: Sender<Vec<i16>>,
    fault: Fault,
    gate_enabled: Arc<AtomicBool>,
}

/// Callback-side state: converts, gates and forwards chunks.
struct ChunkSink {
    channels: usize,
    gate: NoiseGate,
    gate_enabled: Arc<AtomicBool>,
    tx: Sender<Vec<i16>>,
}

impl ChunkSink {
    fn deliver(&mut self, interleaved: &[i16]) {
        let mut mono = pcm::downmix_to_mono(interleaved, self.channels);
        if mono.is_empty() {
            return;
        }
        if self.gate_enabled.load(Ordering::Relaxed) {
            let was_open = self.gate.is_open();
            self.gate.process(&mut mono);
            if self.gate.is_open() != was_open {
                log::debug!("Noise gate {}", if was_open { "closed" } else { "opened" });
            }
        }
        if self.tx.send(mono).is_err() {
            log::debug!("Sample receiver dropped");
        }
    }
}

fn run_stream_thread(
    params: StreamParams,
    control_rx: Receiver<StreamCommand>,
    ready_tx: Sender<Result<StreamSetup, CaptureError>>,
) {
    let (stream, setup) = match build_stream(params) {
        Ok(built) => built,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    if ready_tx.send(Ok(setup)).is_err() {
        return;
    }

    for command in control_rx {
        match command {
            StreamCommand::Play(reply) => {
                let result = stream.play().map_err(|e| match e {
                    cpal::PlayStreamError::DeviceNotAvailable => CaptureError::DeviceNotAvailable,
                    other => CaptureError::Device(format!("failed to start stream: {}", other)),
                });
                let _ = reply.send(result);
            }
            StreamCommand::Pause(reply) => {
                let result = stream
                    .pause()
                    .map_err(|e| CaptureError::Device(format!("failed to pause stream: {}", e)));
                let _ = reply.send(result);
            }
            StreamCommand::Close => break,
        }
    }

    drop(stream);
    log::debug!("Input stream released");
}

fn build_stream(params: StreamParams) -> Result<(cpal::Stream, StreamSetup), CaptureError> {
    let host = cpal::default_host();
    let device = resolve_input_device(&host, params.device_name.as_deref())?;
    let device_name = device.name().unwrap_or_else(|_| "unknown".into());

    let candidates: Vec<ConfigCandidate> = device
        .supported_input_configs()
        .map_err(|e| CaptureError::Device(format!("failed to query input configs: {}", e)))?
        .map(|range| ConfigCandidate::from_range(&range))
        .collect();

    let chosen = select_config(&candidates, params.sample_rate).ok_or_else(|| {
        CaptureError::Device(format!(
            "'{}' has no usable input configuration at {} Hz",
            device_name, params.sample_rate
        ))
    })?;
    let format = chosen.format.ok_or_else(|| CaptureError::device("unsupported sample format"))?;

    let stream_config = cpal::StreamConfig {
        channels: chosen.channels,
        sample_rate: cpal::SampleRate(params.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let mut sink = ChunkSink {
        channels: chosen.channels as usize,
        gate: NoiseGate::default(),
        gate_enabled: params.gate_enabled,
        tx: params.sample_tx,
    };

    let fault = params.fault;
    let on_error = move |err: cpal::StreamError| {
        log::error!("Input stream error: {}", err);
        let latched = match err {
            cpal::StreamError::DeviceNotAvailable => CaptureError::DeviceNotAvailable,
            other => CaptureError::Device(other.to_string()),
        };
        fault.lock().get_or_insert(latched);
    };

    let built = match format {
        InputFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| sink.deliver(data),
            on_error,
            None,
        ),
        InputFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                sink.deliver(&pcm::convert_f32_to_i16(data))
            },
            on_error,
            None,
        ),
    };

    let stream = built.map_err(|e| match e {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceNotAvailable,
        other => CaptureError::Device(format!("failed to build input stream: {}", other)),
    })?;

    let setup = StreamSetup {
        device_name,
        device_channels: chosen.channels,
        format,
        min_buffer_size: chosen.min_buffer_size(),
    };
    Ok((stream, setup))
}
