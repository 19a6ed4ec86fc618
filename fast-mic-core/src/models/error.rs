use thiserror::Error;

/// Errors that can occur during microphone capture.
///
/// `PermissionDenied` is the permission class, `DeviceNotAvailable` and
/// `Device` are the device class, `InvalidState` rejects a lifecycle call that
/// does not fit the current [`CaptureState`](super::state::CaptureState).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("microphone permission not granted")]
    PermissionDenied,

    #[error("audio input device not available")]
    DeviceNotAvailable,

    #[error("device error: {0}")]
    Device(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Coarse classification used by the method channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Permission,
    Device,
    InvalidState,
}

impl ErrorKind {
    /// Stable error code sent to method channel callers.
    pub fn code(self) -> &'static str {
        match self {
            Self::Permission => "PERMISSION_DENIED",
            Self::Device => "DEVICE_ERROR",
            Self::InvalidState => "INVALID_STATE",
        }
    }
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied => ErrorKind::Permission,
            Self::DeviceNotAvailable | Self::Device(_) => ErrorKind::Device,
            Self::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    /// Shorthand for `CaptureError::Device(msg.to_string())`.
    pub fn device(msg: impl std::fmt::Display) -> Self {
        Self::Device(msg.to_string())
    }
}
