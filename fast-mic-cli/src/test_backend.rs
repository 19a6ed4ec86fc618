use std::thread;
use std::time::Duration;

use fast_mic_core::{AudioBackend, AudioSource, CaptureConfig, CaptureError};

/// Produces a constant sample value, optionally failing after some reads.
pub struct ToneBackend {
    value: i16,
    fail_after: Option<usize>,
}

impl ToneBackend {
    pub fn new(value: i16) -> Self {
        Self {
            value,
            fail_after: None,
        }
    }

    pub fn failing_after(reads: usize) -> Self {
        Self {
            value: 1,
            fail_after: Some(reads),
        }
    }
}

impl AudioBackend for ToneBackend {
    type Source = ToneSource;

    fn open(&self, _config: &CaptureConfig) -> Result<ToneSource, CaptureError> {
        Ok(ToneSource {
            value: self.value,
            reads_left: self.fail_after,
        })
    }
}

pub struct ToneSource {
    value: i16,
    reads_left: Option<usize>,
}

impl AudioSource for ToneSource {
    fn min_buffer_size(&self) -> usize {
        16
    }

    fn start_streaming(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn stop_streaming(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn read(&mut self, buffer: &mut [i16]) -> Result<usize, CaptureError> {
        thread::sleep(Duration::from_millis(1));
        if let Some(left) = self.reads_left.as_mut() {
            if *left == 0 {
                return Err(CaptureError::device("device unplugged"));
            }
            *left -= 1;
        }
        buffer.fill(self.value);
        Ok(buffer.len())
    }

    fn close(self) -> Result<(), CaptureError> {
        Ok(())
    }
}
