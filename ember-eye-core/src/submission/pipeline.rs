use log::{info, warn};

use crate::models::artifact::Artifact;
use crate::models::config::SessionConfiguration;
use crate::models::detection::DetectionResult;
use crate::models::error::CaptureError;
use crate::traits::detection_client::{DetectionClient, DetectionRequest};

/// Packages an artifact, issues one detection request and decodes the outcome.
///
/// No retries: a failure is surfaced once and the caller decides whether to
/// submit again.
pub struct SubmissionPipeline<C: DetectionClient> {
    client: C,
    attachment_field: String,
}

impl<C: DetectionClient> SubmissionPipeline<C> {
    pub fn new(client: C, config: &SessionConfiguration) -> Self {
        Self {
            client,
            attachment_field: config.attachment_field.clone(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// The multipart payload for `artifact`, tagged according to its mode.
    pub fn build_request(&self, artifact: &Artifact) -> DetectionRequest {
        let mode = artifact.mode();
        DetectionRequest {
            field_name: self.attachment_field.clone(),
            file_name: mode.file_name(),
            content_type: mode.content_type(),
            artifact: artifact.clone(),
        }
    }

    pub async fn submit(&self, artifact: &Artifact) -> Result<DetectionResult, CaptureError> {
        let request = self.build_request(artifact);
        info!(
            "submitting {} ({} bytes, {})",
            request.file_name,
            artifact.len(),
            artifact.metadata().id
        );

        let response = self.client.send(request).await?;
        if !response.is_success() {
            return Err(CaptureError::Service {
                status: response.status,
                body: response.body_text(),
            });
        }

        let result = DetectionResult::from_json(&response.body)?;
        if let Some(message) = &result.service_message {
            warn!("detection service reported: {}", message);
        }
        info!(
            "detection finished for {}: {}",
            artifact.metadata().id,
            result.summary()
        );
        Ok(result)
    }
}
