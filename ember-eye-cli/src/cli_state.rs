use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use ember_eye_core::{
    ArtifactMetadata, CameraDevice, CaptureError, CaptureSession, Detection, DetectionResult,
    HttpDetectionClient, SessionConfiguration, SessionDelegate, SessionState,
};
use ember_eye_replay::ReplayPlatform;

pub type Session = CaptureSession<ReplayPlatform, HttpDetectionClient>;

/// Build a session over the replay cameras under `root`, with devices enumerated.
pub async fn open_session(root: &Path, config: SessionConfiguration) -> Result<Session> {
    let client = HttpDetectionClient::new(&config)?;
    let mut session = CaptureSession::new(ReplayPlatform::new(root), client, config)?;
    session.set_delegate(LogDelegate::new());
    session
        .refresh_devices()
        .await
        .with_context(|| format!("unable to list cameras under {}", root.display()))?;
    Ok(session)
}

/// SessionDelegate that forwards session events to the log.
pub struct LogDelegate;

impl LogDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl SessionDelegate for LogDelegate {
    fn on_state_changed(&self, state: SessionState) {
        log::debug!("session state: {}", state.as_str());
    }

    fn on_error(&self, error: &CaptureError) {
        log::error!("session error: {}", error);
    }

    fn on_artifact_ready(&self, metadata: &ArtifactMetadata) {
        log::info!(
            "artifact {} ready ({:?}, {} bytes)",
            metadata.id,
            metadata.mode,
            metadata.size_bytes
        );
    }

    fn on_result(&self, result: &DetectionResult) {
        log::info!("detection result: {}", result.summary());
    }
}

// -- Output payloads --

#[derive(Clone, Serialize)]
pub struct DeviceInfo {
    pub id: String,
    pub label: String,
    pub is_default: bool,
}

impl DeviceInfo {
    pub fn list(devices: &[CameraDevice], active: Option<&str>) -> Vec<Self> {
        devices
            .iter()
            .enumerate()
            .map(|(index, device)| Self {
                id: device.id.clone(),
                label: device.display_label(index),
                is_default: active == Some(device.id.as_str()),
            })
            .collect()
    }
}

#[derive(Serialize)]
pub struct DetectionReport<'a> {
    pub artifact: &'a ArtifactMetadata,
    pub summary: String,
    pub detections: &'a [Detection],
    pub annotated_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,
}

impl DetectionReport<'_> {
    pub fn render(&self) -> String {
        let mut out = format!(
            "artifact {} ({:?}, {} bytes, sha256 {})\n{}",
            self.artifact.id, self.artifact.mode, self.artifact.size_bytes, self.artifact.checksum, self.summary
        );
        for (index, detection) in self.detections.iter().enumerate() {
            out.push_str(&format!(
                "\n  {}. {} {:.1}%",
                index + 1,
                detection.label().unwrap_or("unknown"),
                detection.confidence().unwrap_or(0.0) * 100.0
            ));
        }
        if let Some(message) = self.service_message {
            out.push_str(&format!("\nservice reported: {}", message));
        }
        out.push_str(&format!("\nannotated: {}", self.annotated_url));
        if let Some(path) = &self.saved_to {
            out.push_str(&format!("\nsaved to {}", path));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_eye_core::{Artifact, CaptureMode};

    #[test]
    fn unlabeled_devices_are_numbered() {
        let devices = vec![CameraDevice::new("front", "Front door"), CameraDevice::new("garage", "")];

        let listed = DeviceInfo::list(&devices, Some("garage"));

        assert_eq!(listed[0].label, "Front door");
        assert!(!listed[0].is_default);
        assert_eq!(listed[1].label, "Camera 2");
        assert!(listed[1].is_default);
    }

    #[test]
    fn report_lists_detections() {
        let artifact = Artifact::imported(vec![1, 2, 3], CaptureMode::Photo);
        let result = DetectionResult::from_json(
            br#"{"detections": [{"class": "fire", "confidence": 0.875, "bbox": [1, 2, 3, 4]}], "result_image": "/api/images/r.jpg"}"#,
        )
        .unwrap();

        let report = DetectionReport {
            artifact: artifact.metadata(),
            summary: result.summary(),
            detections: &result.detections,
            annotated_url: "http://localhost:5001/api/images/r.jpg".into(),
            service_message: None,
            saved_to: None,
        };
        let text = report.render();

        assert!(text.contains("1 fire instance(s) detected"));
        assert!(text.contains("1. fire 87.5%"));
        assert!(text.ends_with("annotated: http://localhost:5001/api/images/r.jpg"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["detections"][0]["class"], "fire");
        assert!(json.get("saved_to").is_none());
    }
}
