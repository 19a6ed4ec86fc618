use crate::models::error::CaptureError;
use crate::models::state::CaptureState;

/// Event delegate for capture notifications.
///
/// `on_state_changed` runs on the thread that called `start`/`stop`.
/// `on_error` runs on the capture worker thread; implementations should
/// return quickly and marshal to their own thread if needed.
pub trait CaptureDelegate: Send + Sync {
    /// Called after every lifecycle transition.
    fn on_state_changed(&self, state: CaptureState);

    /// Called when the capture worker stops on a device error.
    fn on_error(&self, error: &CaptureError);
}
