use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::error::CaptureError;
use crate::models::session::{CaptureDiagnostics, SessionInfo};
use crate::models::state::CaptureState;
use crate::session::controller::CaptureController;
use crate::traits::audio_source::AudioBackend;

/// Error code for requests that cannot be parsed.
pub const BAD_REQUEST: &str = "BAD_REQUEST";

/// Error code for a result that could not be encoded.
pub const INTERNAL: &str = "INTERNAL";

/// Methods understood by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Start,
    Poll,
    Stop,
    Status,
}

impl Method {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "poll" => Some(Self::Poll),
            "stop" => Some(Self::Stop),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// One request from the host shell.
///
/// ```json
/// {"id": 7, "method": "poll"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            id: None,
            method: method.into(),
        }
    }
}

/// Reply to a [`MethodCall`], echoing its `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
        result: Value,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
        code: String,
        message: String,
    },
    NotImplemented {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
    },
}

impl MethodResponse {
    fn from_error(id: Option<Value>, error: &CaptureError) -> Self {
        Self::Error {
            id,
            code: error.kind().code().to_string(),
            message: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Payload of a `status` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub state: CaptureState,
    pub worker_alive: bool,
    pub buffered_samples: usize,
    pub session: Option<SessionInfo>,
    pub diagnostics: CaptureDiagnostics,
}

/// Routes host-shell method calls to a [`CaptureController`].
///
/// | method | result |
/// |---|---|
/// | `start` | `null`, or a permission/device/state error |
/// | `poll` | array of i16 samples, possibly empty |
/// | `stop` | `null` |
/// | `status` | [`StatusReport`] |
///
/// Unknown methods answer `not_implemented` without touching the controller.
pub struct MethodChannel<B: AudioBackend> {
    controller: CaptureController<B>,
}

impl<B: AudioBackend> MethodChannel<B> {
    pub fn new(controller: CaptureController<B>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &CaptureController<B> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut CaptureController<B> {
        &mut self.controller
    }

    pub fn dispatch(&mut self, call: &MethodCall) -> MethodResponse {
        let id = call.id.clone();
        let Some(method) = Method::parse(&call.method) else {
            log::debug!("Unknown method: {}", call.method);
            return MethodResponse::NotImplemented { id };
        };

        match method {
            Method::Start => match self.controller.start() {
                Ok(()) => MethodResponse::Success {
                    id,
                    result: Value::Null,
                },
                Err(e) => {
                    log::warn!("start failed: {}", e);
                    MethodResponse::from_error(id, &e)
                }
            },
            Method::Poll => MethodResponse::Success {
                id,
                result: Value::from(self.controller.poll()),
            },
            Method::Stop => match self.controller.stop() {
                Ok(()) => MethodResponse::Success {
                    id,
                    result: Value::Null,
                },
                Err(e) => MethodResponse::from_error(id, &e),
            },
            Method::Status => {
                let report = self.status();
                match serde_json::to_value(&report) {
                    Ok(result) => MethodResponse::Success { id, result },
                    Err(e) => MethodResponse::Error {
                        id,
                        code: INTERNAL.into(),
                        message: format!("failed to serialize status: {}", e),
                    },
                }
            }
        }
    }

    /// Parse one JSON request line and dispatch it.
    pub fn handle_line(&mut self, line: &str) -> MethodResponse {
        match serde_json::from_str::<MethodCall>(line) {
            Ok(call) => self.dispatch(&call),
            Err(e) => MethodResponse::Error {
                id: None,
                code: BAD_REQUEST.into(),
                message: format!("invalid request: {}", e),
            },
        }
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            state: self.controller.state(),
            worker_alive: self.controller.is_worker_alive(),
            buffered_samples: self.controller.sample_buffer().len(),
            session: self.controller.session().cloned(),
            diagnostics: self.controller.diagnostics(),
        }
    }
}
