use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::capture_models::CaptureMode;
use super::error::CaptureError;

/// The single captured still image or assembled video clip of a session.
///
/// Artifacts are immutable once produced; sessions replace them, never edit them.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    bytes: Arc<[u8]>,
    metadata: ArtifactMetadata,
}

/// Metadata computed once when an artifact is produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactMetadata {
    pub id: String,
    pub mode: CaptureMode,
    pub device_id: Option<String>,
    pub size_bytes: usize,
    pub checksum: String,
    pub created_at: String,
    pub chunk_count: Option<usize>,
}

impl Artifact {
    /// A still frame grabbed from `device_id`.
    pub fn photo(bytes: Vec<u8>, device_id: &str) -> Self {
        Self::build(bytes, CaptureMode::Photo, Some(device_id.to_string()), None)
    }

    /// A clip assembled from `chunk_count` recorder chunks.
    pub fn clip(bytes: Vec<u8>, device_id: &str, chunk_count: usize) -> Self {
        Self::build(
            bytes,
            CaptureMode::Video,
            Some(device_id.to_string()),
            Some(chunk_count),
        )
    }

    /// Bytes supplied directly by the user rather than a device.
    pub fn imported(bytes: Vec<u8>, mode: CaptureMode) -> Self {
        Self::build(bytes, mode, None, None)
    }

    /// Read an existing image or video file; the mode follows the extension.
    ///
    /// Only the mode is kept. The upload is named and typed from the mode, so
    /// a `.png` goes out as `webcam-capture.jpg` (`image/jpeg`) and an `.avi`
    /// as `webcam-recording.webm` (`video/webm`); the service dispatches on
    /// the extension alone and decodes the bytes by content.
    pub fn from_file(path: &Path) -> Result<Self, CaptureError> {
        let bytes = fs::read(path)
            .map_err(|e| CaptureError::Storage(format!("failed to read {}: {}", path.display(), e)))?;
        let mode = path
            .extension()
            .map(|ext| CaptureMode::from_extension(&ext.to_string_lossy()))
            .unwrap_or_default();
        Ok(Self::imported(bytes, mode))
    }

    fn build(bytes: Vec<u8>, mode: CaptureMode, device_id: Option<String>, chunk_count: Option<usize>) -> Self {
        let checksum = format!("{:x}", Sha256::digest(&bytes));
        let metadata = ArtifactMetadata {
            id: uuid::Uuid::new_v4().to_string(),
            mode,
            device_id,
            size_bytes: bytes.len(),
            checksum,
            created_at: chrono::Utc::now().to_rfc3339(),
            chunk_count,
        };
        Self {
            bytes: bytes.into(),
            metadata,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn mode(&self) -> CaptureMode {
        self.metadata.mode
    }

    pub fn device_id(&self) -> Option<&str> {
        self.metadata.device_id.as_deref()
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }
}
