use super::pcm::rms_level;

/// Default open threshold, about -46 dBFS.
pub const DEFAULT_THRESHOLD: f32 = 0.005;

/// Default hold time after the signal drops below the threshold (100 ms at 48 kHz).
pub const DEFAULT_HOLD_SAMPLES: usize = 4_800;

/// Software noise suppression for backends without a platform effect.
///
/// Chunk-level gate: a chunk whose RMS reaches the threshold opens the gate,
/// and it stays open for `hold_samples` after the level falls again. Chunks
/// arriving while the gate is closed are replaced with silence. Chunk length
/// is never changed, so sample counts stay aligned with capture time.
#[derive(Debug, Clone)]
pub struct NoiseGate {
    threshold: f32,
    hold_samples: usize,
    hold_remaining: usize,
}

impl NoiseGate {
    pub fn new(threshold: f32, hold_samples: usize) -> Self {
        Self {
            threshold,
            hold_samples,
            hold_remaining: 0,
        }
    }

    /// Whether the last processed chunk passed through.
    pub fn is_open(&self) -> bool {
        self.hold_remaining > 0
    }

    /// Gate `chunk` in place.
    pub fn process(&mut self, chunk: &mut [i16]) {
        if chunk.is_empty() {
            return;
        }
        if rms_level(chunk) >= self.threshold {
            self.hold_remaining = self.hold_samples.max(chunk.len());
            return;
        }
        if self.hold_remaining > 0 {
            self.hold_remaining = self.hold_remaining.saturating_sub(chunk.len());
            return;
        }
        chunk.fill(0);
    }
}

impl Default for NoiseGate {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_HOLD_SAMPLES)
    }
}
