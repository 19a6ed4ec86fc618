//! Input device enumeration via cpal.

use cpal::traits::{DeviceTrait, HostTrait};

use fast_mic_core::{CaptureError, InputDevice};

/// List input devices on the default host.
pub fn list_input_devices() -> Result<Vec<InputDevice>, CaptureError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::Device(format!("failed to enumerate input devices: {}", e)))?;

    Ok(devices
        .filter_map(|d| d.name().ok())
        .map(|name| {
            let is_default = default_name.as_deref() == Some(name.as_str());
            InputDevice { name, is_default }
        })
        .collect())
}

/// Resolve the named input device, or the host default when `name` is `None`.
pub(crate) fn resolve_input_device(
    host: &cpal::Host,
    name: Option<&str>,
) -> Result<cpal::Device, CaptureError> {
    let Some(name) = name else {
        return host
            .default_input_device()
            .ok_or(CaptureError::DeviceNotAvailable);
    };

    host.input_devices()
        .map_err(|e| CaptureError::Device(format!("failed to enumerate input devices: {}", e)))?
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or(CaptureError::DeviceNotAvailable)
}
