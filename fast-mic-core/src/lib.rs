//! # fast-mic-core
//!
//! Platform-agnostic microphone capture core.
//!
//! A background worker reads a hardware input stream and appends into a
//! shared sample buffer; consumers drain everything captured since their last
//! call. Platform backends (cpal, see `fast-mic-device`) implement the
//! `AudioBackend` trait and plug into the generic `CaptureController`.
//!
//! ## Architecture
//!
//! ```text
//! fast-mic-core (this crate)
//! ├── traits/       ← AudioBackend, AudioSource, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfig, SessionInfo, etc.
//! ├── processing/   ← SampleBuffer, NoiseGate, PCM helpers
//! ├── session/      ← CaptureWorker, CaptureController
//! └── dispatch/     ← MethodChannel (start / poll / stop / status)
//! ```
//!
//! ## Format
//!
//! 48000 Hz, mono, signed 16-bit PCM. Samples are `i16` in host order;
//! byte serializations are little-endian (see [`processing::pcm`]).

pub mod dispatch;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use dispatch::method_channel::{Method, MethodCall, MethodChannel, MethodResponse, StatusReport};
pub use models::audio_models::InputDevice;
pub use models::config::{CaptureConfig, SampleEncoding, CHANNELS, SAMPLE_RATE};
pub use models::error::{CaptureError, ErrorKind};
pub use models::session::{CaptureDiagnostics, SessionInfo};
pub use models::state::CaptureState;
pub use processing::noise_gate::NoiseGate;
pub use processing::sample_buffer::SampleBuffer;
pub use session::controller::CaptureController;
pub use session::worker::{CaptureWorker, WorkerContext, WorkerExit};
pub use traits::audio_source::{open_source, AudioBackend, AudioSource};
pub use traits::capture_delegate::CaptureDelegate;
