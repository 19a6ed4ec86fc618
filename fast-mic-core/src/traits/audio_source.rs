use crate::models::config::CaptureConfig;
use crate::models::error::CaptureError;

/// Factory for platform input streams.
///
/// Implemented by:
/// - `CpalBackend` (fast-mic-device)
/// - scripted test backends
pub trait AudioBackend: Send + Sync {
    type Source: AudioSource;

    /// Open an input stream in the format described by `config`.
    ///
    /// Fails with `PermissionDenied` when microphone access has not been
    /// granted, and with a device error when the platform cannot build a
    /// stream in the requested format.
    fn open(&self, config: &CaptureConfig) -> Result<Self::Source, CaptureError>;
}

/// An opened hardware input stream.
///
/// Owned by exactly one thread at a time: the controller between sessions,
/// the capture worker while recording.
pub trait AudioSource: Send + Sized + 'static {
    /// Smallest read size, in samples, the device buffers internally.
    fn min_buffer_size(&self) -> usize;

    /// Attach a noise suppression effect to the stream.
    ///
    /// Sources without one keep this default.
    fn enable_noise_suppression(&mut self) -> Result<(), CaptureError> {
        Err(CaptureError::device("noise suppression not supported"))
    }

    /// Begin hardware delivery.
    fn start_streaming(&mut self) -> Result<(), CaptureError>;

    /// Halt hardware delivery.
    fn stop_streaming(&mut self) -> Result<(), CaptureError>;

    /// Blocking read of up to `buffer.len()` samples.
    ///
    /// `Ok(0)` means no data arrived in time; callers re-check their run flag
    /// and read again.
    fn read(&mut self, buffer: &mut [i16]) -> Result<usize, CaptureError>;

    /// Release the device.
    fn close(self) -> Result<(), CaptureError>;
}

/// Open a source through `backend` and attach noise suppression.
///
/// A noise suppression failure is logged and capture continues without it.
pub fn open_source<B: AudioBackend + ?Sized>(
    backend: &B,
    config: &CaptureConfig,
) -> Result<B::Source, CaptureError> {
    config
        .validate()
        .map_err(|e| CaptureError::Device(format!("invalid capture configuration: {}", e)))?;

    let mut source = backend.open(config)?;

    if config.noise_suppression {
        match source.enable_noise_suppression() {
            Ok(()) => log::debug!("Noise suppression attached"),
            Err(e) => log::warn!("Noise suppression unavailable, continuing without it: {}", e),
        }
    }

    Ok(source)
}
