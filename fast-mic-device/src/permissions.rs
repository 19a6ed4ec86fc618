//! Microphone permission check.
//!
//! On Windows 10 1803+, microphone access is controlled by the privacy
//! settings at Settings > Privacy > Microphone. Activating an audio client on
//! the default capture endpoint fails with `E_ACCESSDENIED` when it is off.
//!
//! Other platforms prompt (or refuse) when the stream is opened, so the check
//! reports granted and lets stream construction surface the failure.

use fast_mic_core::CaptureError;

/// Whether the process may open the microphone.
#[cfg(target_os = "windows")]
pub fn check_microphone_permission() -> Result<bool, CaptureError> {
    use windows::Win32::System::Com::*;

    unsafe {
        CoInitializeEx(None, COINIT_MULTITHREADED)
            .ok()
            .map_err(|e| CaptureError::Device(format!("CoInitializeEx failed: {}", e)))?;

        let result = check_mic_access_inner();

        CoUninitialize();
        result
    }
}

#[cfg(target_os = "windows")]
unsafe fn check_mic_access_inner() -> Result<bool, CaptureError> {
    use windows::Win32::Foundation::E_ACCESSDENIED;
    use windows::Win32::Media::Audio::*;
    use windows::Win32::System::Com::*;

    let enumerator: IMMDeviceEnumerator =
        CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
            .map_err(|e| CaptureError::Device(format!("failed to create enumerator: {}", e)))?;

    // No capture endpoint is a device problem, reported when the stream opens.
    let device = match enumerator.GetDefaultAudioEndpoint(eCapture, eConsole) {
        Ok(d) => d,
        Err(_) => return Ok(true),
    };

    let result: windows::core::Result<IAudioClient> = device.Activate(CLSCTX_ALL, None);

    match result {
        Ok(_) => Ok(true),
        Err(e) if e.code() == E_ACCESSDENIED => Ok(false),
        Err(e) => {
            log::warn!("Unexpected error checking mic permission: {}", e);
            Ok(true)
        }
    }
}

/// Whether the process may open the microphone.
#[cfg(not(target_os = "windows"))]
pub fn check_microphone_permission() -> Result<bool, CaptureError> {
    Ok(true)
}
