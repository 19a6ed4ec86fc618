use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::CaptureConfig;

/// Identity of one start/stop cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    /// RFC 3339, UTC.
    pub started_at: String,
    pub sample_rate: u32,
    pub channels: u16,
    /// Worker scratch buffer size in samples.
    pub buffer_size: usize,
}

impl SessionInfo {
    pub fn new(config: &CaptureConfig, buffer_size: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            sample_rate: config.sample_rate,
            channels: config.channels,
            buffer_size,
        }
    }
}

/// Counters for debugging a capture session. Reset on every `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDiagnostics {
    pub device_reads: u64,
    pub empty_reads: u64,
    pub samples_captured: u64,
    /// Samples drained from the sample buffer by any consumer.
    pub samples_polled: u64,
    /// Set when the worker died on a device error.
    pub last_error: Option<String>,
}

impl CaptureDiagnostics {
    /// Samples captured but not yet drained.
    pub fn samples_pending(&self) -> u64 {
        self.samples_captured.saturating_sub(self.samples_polled)
    }
}
