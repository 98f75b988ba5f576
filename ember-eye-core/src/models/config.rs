use std::time::Duration;

use serde::Deserialize;

/// Configuration for a capture session and its detection service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    /// Base URL of the detection service (default: `http://localhost:5001`).
    pub service_url: String,

    /// Path of the detection endpoint (default: `/api/detect`).
    pub detect_path: String,

    /// Multipart field carrying the artifact (default: `file`).
    pub attachment_field: String,

    /// Timeout for one detection round trip, in seconds (default: 60).
    pub request_timeout_secs: u64,

    /// Open video streams with audio (default: true). Photo streams never carry audio.
    pub record_audio: bool,

    /// Upper bound on waiting for the recorder to finalize in `stop()` (default: 10).
    pub finalize_timeout_secs: u64,
}

impl SessionConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.service_url.starts_with("http://") || self.service_url.starts_with("https://")) {
            return Err(format!("service url must be http(s): {}", self.service_url));
        }
        if !self.detect_path.starts_with('/') {
            return Err(format!("detect path must start with '/': {}", self.detect_path));
        }
        if self.attachment_field.is_empty() {
            return Err("attachment field must not be empty".into());
        }
        if self.request_timeout_secs == 0 {
            return Err("request timeout must be positive".into());
        }
        if self.finalize_timeout_secs == 0 {
            return Err("finalize timeout must be positive".into());
        }
        Ok(())
    }

    pub fn detect_url(&self) -> String {
        format!("{}{}", self.service_url.trim_end_matches('/'), self.detect_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn finalize_timeout(&self) -> Duration {
        Duration::from_secs(self.finalize_timeout_secs)
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:5001".into(),
            detect_path: "/api/detect".into(),
            attachment_field: "file".into(),
            request_timeout_secs: 60,
            record_audio: true,
            finalize_timeout_secs: 10,
        }
    }
}
