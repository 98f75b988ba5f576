use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};

use crate::models::config::SessionConfiguration;
use crate::models::detection::DetectionResult;
use crate::models::error::CaptureError;
use crate::traits::detection_client::{DetectionClient, DetectionRequest, ServiceResponse};

/// Detection transport over HTTP multipart, backed by `reqwest`.
pub struct HttpDetectionClient {
    http: reqwest::Client,
    service_url: String,
    detect_url: String,
}

impl HttpDetectionClient {
    pub fn new(config: &SessionConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::Configuration)?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CaptureError::Configuration(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            http,
            service_url: config.service_url.trim_end_matches('/').to_string(),
            detect_url: config.detect_url(),
        })
    }

    pub fn detect_url(&self) -> &str {
        &self.detect_url
    }

    /// Absolute URL of a locator returned by the service.
    pub fn resolve_locator(&self, locator: &str) -> String {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            locator.to_string()
        } else if locator.starts_with('/') {
            format!("{}{}", self.service_url, locator)
        } else {
            format!("{}/{}", self.service_url, locator)
        }
    }

    /// Download the annotated output of a detection.
    pub async fn fetch_annotated(&self, result: &DetectionResult) -> Result<Vec<u8>, CaptureError> {
        let url = self.resolve_locator(&result.annotated_resource_locator);
        debug!("fetching annotated output from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CaptureError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| CaptureError::Network(e.to_string()))?;

        if !response_ok(status) {
            return Err(CaptureError::Service {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body.to_vec())
    }
}

fn response_ok(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait]
impl DetectionClient for HttpDetectionClient {
    async fn send(&self, request: DetectionRequest) -> Result<ServiceResponse, CaptureError> {
        let part = Part::bytes(request.artifact.bytes().to_vec())
            .file_name(request.file_name)
            .mime_str(request.content_type)
            .map_err(|e| CaptureError::Configuration(format!("invalid content type: {}", e)))?;
        let form = Form::new().part(request.field_name, part);

        debug!("POST {} ({} bytes)", self.detect_url, request.artifact.len());
        let response = self
            .http
            .post(&self.detect_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CaptureError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| CaptureError::Network(e.to_string()))?;

        Ok(ServiceResponse {
            status,
            body: body.to_vec(),
        })
    }
}
