use thiserror::Error;

/// Errors that can occur during capture, recording and detection submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("device access failed: {0}")]
    DeviceAccess(String),

    #[error("no camera available")]
    NoActiveDevice,

    #[error("unknown device: {0}")]
    UnknownDevice(String),

    #[error("recorder unavailable: {0}")]
    RecorderUnavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("service error ({status}): {body}")]
    Service { status: u16, body: String },

    #[error("malformed detection response: {0}")]
    Encoding(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("operation superseded by a session reset")]
    Cancelled,

    #[error("timeout")]
    Timeout,

    #[error("configuration failed: {0}")]
    Configuration(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl CaptureError {
    /// HTTP status of a `Service` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}
