use std::sync::Arc;

use async_trait::async_trait;

use crate::models::artifact::Artifact;
use crate::models::error::CaptureError;

/// One multipart upload against the detection endpoint.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub field_name: String,
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub artifact: Artifact,
}

/// Raw status and body returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ServiceResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport to the detection service.
///
/// Implementations issue exactly one request per call and never retry;
/// transport failures are reported as `CaptureError::Network`.
#[async_trait]
pub trait DetectionClient: Send + Sync {
    async fn send(&self, request: DetectionRequest) -> Result<ServiceResponse, CaptureError>;
}

#[async_trait]
impl<T: DetectionClient + ?Sized> DetectionClient for Arc<T> {
    async fn send(&self, request: DetectionRequest) -> Result<ServiceResponse, CaptureError> {
        (**self).send(request).await
    }
}
