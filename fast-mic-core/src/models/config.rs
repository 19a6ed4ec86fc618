use serde::{Deserialize, Serialize};

/// Sample rate every capture session runs at.
pub const SAMPLE_RATE: u32 = 48_000;

/// Channel count every capture session runs at.
pub const CHANNELS: u16 = 1;

/// On-the-wire sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    /// Signed 16-bit PCM. Held as `i16` in host order; serialized little-endian.
    PcmI16,
}

/// Configuration for capture sessions.
///
/// The audio format itself is fixed (48 kHz, mono, signed 16-bit PCM);
/// only the buffering and the noise suppression toggle are tunable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Sample rate in Hz (always 48000).
    pub sample_rate: u32,

    /// Number of channels (always 1).
    pub channels: u16,

    /// Sample encoding (always signed 16-bit PCM).
    pub encoding: SampleEncoding,

    /// Worker scratch buffer size in samples. `None` uses the minimum buffer
    /// size the device reports when it is opened.
    pub buffer_size: Option<usize>,

    /// Attach a noise suppression effect to each opened source (default: true).
    pub noise_suppression: bool,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate != SAMPLE_RATE {
            return Err(format!(
                "unsupported sample rate: {} (only {} Hz)",
                self.sample_rate, SAMPLE_RATE
            ));
        }
        if self.channels != CHANNELS {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if self.buffer_size == Some(0) {
            return Err("buffer size must be positive".into());
        }
        Ok(())
    }

    /// Scratch buffer size for a source that reports `device_min` samples.
    pub fn scratch_size(&self, device_min: usize) -> usize {
        self.buffer_size.unwrap_or(device_min).max(1)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            encoding: SampleEncoding::PcmI16,
            buffer_size: None,
            noise_suppression: true,
        }
    }
}
