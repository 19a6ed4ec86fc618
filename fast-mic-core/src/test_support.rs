//! Scripted audio backends for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::config::CaptureConfig;
use crate::models::error::CaptureError;
use crate::traits::audio_source::{AudioBackend, AudioSource};

/// Device operations recorded by [`ScriptedBackend`]. Reads are only counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Open,
    NoiseSuppression,
    StartStreaming,
    StopStreaming,
    Close,
}

/// One scripted result of `AudioSource::read`.
#[derive(Debug, Clone)]
pub enum ReadStep {
    Samples(Vec<i16>),
    Fail(String),
}

#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    script: VecDeque<ReadStep>,
    endless: Option<Vec<i16>>,
    reads: u64,
}

#[derive(Clone)]
pub struct ScriptedBackend {
    shared: Arc<Mutex<Shared>>,
    open_error: Option<CaptureError>,
    start_error: Option<CaptureError>,
    noise_suppression: bool,
    min_buffer_size: usize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared::default())),
            open_error: None,
            start_error: None,
            noise_suppression: true,
            min_buffer_size: 8,
        }
    }

    pub fn deny_permission(self) -> Self {
        self.fail_open(CaptureError::PermissionDenied)
    }

    pub fn fail_open(mut self, error: CaptureError) -> Self {
        self.open_error = Some(error);
        self
    }

    pub fn fail_start(mut self, error: CaptureError) -> Self {
        self.start_error = Some(error);
        self
    }

    pub fn without_noise_suppression(mut self) -> Self {
        self.noise_suppression = false;
        self
    }

    pub fn with_min_buffer_size(mut self, samples: usize) -> Self {
        self.min_buffer_size = samples;
        self
    }

    pub fn with_reads(self, steps: impl IntoIterator<Item = ReadStep>) -> Self {
        self.push_reads(steps);
        self
    }

    /// Once the script runs out, every read returns `chunk`.
    pub fn endless(self, chunk: Vec<i16>) -> Self {
        self.shared.lock().endless = Some(chunk);
        self
    }

    pub fn push_reads(&self, steps: impl IntoIterator<Item = ReadStep>) {
        self.shared.lock().script.extend(steps);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().calls.clone()
    }

    pub fn reads(&self) -> u64 {
        self.shared.lock().reads
    }

    pub fn script_exhausted(&self) -> bool {
        self.shared.lock().script.is_empty()
    }
}

impl AudioBackend for ScriptedBackend {
    type Source = ScriptedSource;

    fn open(&self, _config: &CaptureConfig) -> Result<ScriptedSource, CaptureError> {
        self.shared.lock().calls.push(Call::Open);
        if let Some(e) = &self.open_error {
            return Err(e.clone());
        }
        Ok(ScriptedSource {
            shared: Arc::clone(&self.shared),
            min_buffer_size: self.min_buffer_size,
            noise_suppression: self.noise_suppression,
            start_error: self.start_error.clone(),
            streaming: false,
        })
    }
}

pub struct ScriptedSource {
    shared: Arc<Mutex<Shared>>,
    min_buffer_size: usize,
    noise_suppression: bool,
    start_error: Option<CaptureError>,
    streaming: bool,
}

impl ScriptedSource {
    fn record(&self, call: Call) {
        self.shared.lock().calls.push(call);
    }
}

impl AudioSource for ScriptedSource {
    fn min_buffer_size(&self) -> usize {
        self.min_buffer_size
    }

    fn enable_noise_suppression(&mut self) -> Result<(), CaptureError> {
        self.record(Call::NoiseSuppression);
        if self.noise_suppression {
            Ok(())
        } else {
            Err(CaptureError::device("no noise suppressor on this device"))
        }
    }

    fn start_streaming(&mut self) -> Result<(), CaptureError> {
        self.record(Call::StartStreaming);
        if let Some(e) = self.start_error.take() {
            return Err(e);
        }
        self.streaming = true;
        Ok(())
    }

    fn stop_streaming(&mut self) -> Result<(), CaptureError> {
        self.record(Call::StopStreaming);
        if !self.streaming {
            return Err(CaptureError::device("stream not started"));
        }
        self.streaming = false;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [i16]) -> Result<usize, CaptureError> {
        let (step, paced) = {
            let mut shared = self.shared.lock();
            shared.reads += 1;
            match shared.script.pop_front() {
                Some(step) => (Some(step), false),
                None => (shared.endless.clone().map(ReadStep::Samples), true),
            }
        };

        // Endless and idle reads stand in for a blocking device.
        if paced {
            thread::sleep(Duration::from_millis(1));
        }

        match step {
            Some(ReadStep::Samples(samples)) => {
                let count = samples.len().min(buffer.len());
                buffer[..count].copy_from_slice(&samples[..count]);
                Ok(count)
            }
            Some(ReadStep::Fail(msg)) => Err(CaptureError::Device(msg)),
            None => Ok(0),
        }
    }

    fn close(self) -> Result<(), CaptureError> {
        self.record(Call::Close);
        Ok(())
    }
}

/// Poll `condition` every millisecond until it holds or two seconds pass.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
