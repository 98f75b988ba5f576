use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::CaptureError;

/// One located fire instance as returned by the service.
///
/// The record is kept opaque; the accessors only read it for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Detection(pub Value);

impl Detection {
    pub fn label(&self) -> Option<&str> {
        self.0.get("class").and_then(Value::as_str)
    }

    pub fn confidence(&self) -> Option<f64> {
        self.0.get("confidence").and_then(Value::as_f64)
    }
}

/// Decoded success response of the detection service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    /// Where the annotated output can be fetched, relative to the service.
    pub annotated_resource_locator: String,
    pub detections: Vec<Detection>,
    /// Set when the service rendered an error image instead of detections.
    pub service_message: Option<String>,
}

#[derive(Deserialize)]
struct WireResponse {
    result_image: Option<String>,
    detections: Option<Vec<Detection>>,
    error: Option<String>,
}

impl DetectionResult {
    /// Decode a success body. Missing fields are an `Encoding` error, never an empty result.
    pub fn from_json(body: &[u8]) -> Result<Self, CaptureError> {
        let wire: WireResponse =
            serde_json::from_slice(body).map_err(|e| CaptureError::Encoding(e.to_string()))?;

        let annotated_resource_locator = wire
            .result_image
            .filter(|locator| !locator.is_empty())
            .ok_or_else(|| CaptureError::Encoding("missing result_image".into()))?;
        let detections = wire
            .detections
            .ok_or_else(|| CaptureError::Encoding("missing detections".into()))?;

        Ok(Self {
            annotated_resource_locator,
            detections,
            service_message: wire.error,
        })
    }

    pub fn detection_count(&self) -> usize {
        self.detections.len()
    }

    pub fn summary(&self) -> String {
        match self.detections.len() {
            0 => "No fire detected".to_string(),
            n => format!("{} fire instance(s) detected", n),
        }
    }
}
