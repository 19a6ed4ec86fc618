//! Input configuration selection.
//!
//! The capture format is fixed at 48 kHz mono i16, but devices advertise
//! whatever they support. Preference order at the requested rate:
//! mono i16, mono f32, then multi-channel i16/f32 (downmixed in the callback).
//! Nothing is resampled: a device without the requested rate is rejected.

use cpal::{SampleFormat, SupportedBufferSize, SupportedStreamConfigRange};

/// Minimum buffer size when the platform does not report one: 40 ms at 48 kHz.
pub const FALLBACK_MIN_BUFFER_SIZE: usize = 1_920;

/// Floor for reported minimum buffer sizes: 10 ms at 48 kHz.
pub const MIN_BUFFER_FLOOR: usize = 480;

/// Sample formats the callback can convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    I16,
    F32,
}

/// Hardware-independent view of one `SupportedStreamConfigRange`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigCandidate {
    pub channels: u16,
    pub min_sample_rate: u32,
    pub max_sample_rate: u32,
    /// `None` for formats the callback cannot convert.
    pub format: Option<InputFormat>,
    pub min_buffer_frames: Option<u32>,
}

impl ConfigCandidate {
    pub fn from_range(range: &SupportedStreamConfigRange) -> Self {
        let format = match range.sample_format() {
            SampleFormat::I16 => Some(InputFormat::I16),
            SampleFormat::F32 => Some(InputFormat::F32),
            _ => None,
        };
        let min_buffer_frames = match range.buffer_size() {
            SupportedBufferSize::Range { min, .. } if *min > 0 => Some(*min),
            _ => None,
        };
        Self {
            channels: range.channels(),
            min_sample_rate: range.min_sample_rate().0,
            max_sample_rate: range.max_sample_rate().0,
            format,
            min_buffer_frames,
        }
    }

    pub fn supports_rate(&self, sample_rate: u32) -> bool {
        (self.min_sample_rate..=self.max_sample_rate).contains(&sample_rate)
    }

    /// Minimum read size in mono samples.
    pub fn min_buffer_size(&self) -> usize {
        match self.min_buffer_frames {
            Some(frames) => (frames as usize).max(MIN_BUFFER_FLOOR),
            None => FALLBACK_MIN_BUFFER_SIZE,
        }
    }

    fn rank(&self) -> (bool, u8, u16) {
        let format_rank = match self.format {
            Some(InputFormat::I16) => 0,
            _ => 1,
        };
        (self.channels != 1, format_rank, self.channels)
    }
}

/// Pick the best candidate for `sample_rate`, if any.
pub fn select_config(candidates: &[ConfigCandidate], sample_rate: u32) -> Option<ConfigCandidate> {
    candidates
        .iter()
        .filter(|c| c.channels > 0 && c.format.is_some() && c.supports_rate(sample_rate))
        .min_by_key(|c| c.rank())
        .copied()
}
