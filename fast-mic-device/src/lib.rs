//! # fast-mic-device
//!
//! cpal input backend for fast-mic-core.
//!
//! Provides:
//! - `CpalBackend` / `CpalSource`: 48 kHz mono i16 microphone input on the default cpal host
//! - `list_input_devices`: input device enumeration
//! - `permissions`: microphone privacy check (WASAPI check on Windows)
//!
//! ## Usage
//! ```ignore
//! use fast_mic_core::CaptureController;
//! use fast_mic_device::CpalBackend;
//!
//! let mut controller = CaptureController::new(CpalBackend::new());
//! controller.start()?;
//! let samples = controller.poll();
//! controller.stop()?;
//! ```

pub mod cpal_source;
pub mod device_enumerator;
pub mod permissions;
pub mod stream_config;

pub use cpal_source::{CpalBackend, CpalOptions, CpalSource, DEFAULT_READ_TIMEOUT};
pub use device_enumerator::list_input_devices;
pub use permissions::check_microphone_permission;
pub use stream_config::InputFormat;
