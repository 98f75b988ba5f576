use serde::{Deserialize, Serialize};

/// What the session produces: a single still frame or a recorded clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    Photo,
    Video,
}

/// Extensions the detection service treats as video containers.
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "webm"];

impl CaptureMode {
    /// MIME type attached to the uploaded artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Photo => "image/jpeg",
            Self::Video => "video/webm",
        }
    }

    /// File name attached to the uploaded artifact.
    ///
    /// The service picks image or video processing from the extension.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Photo => "webcam-capture.jpg",
            Self::Video => "webcam-recording.webm",
        }
    }

    /// Infer the mode from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else {
            Self::Photo
        }
    }
}

/// A capture device as listed by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
}

impl CameraDevice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Label for display; unlabeled devices become `Camera N` (1-based).
    pub fn display_label(&self, index: usize) -> String {
        if self.label.trim().is_empty() {
            format!("Camera {}", index + 1)
        } else {
            self.label.clone()
        }
    }
}

/// Options used when opening a device stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamOptions {
    pub audio: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_from_extension() {
        assert_eq!(CaptureMode::from_extension("webm"), CaptureMode::Video);
        assert_eq!(CaptureMode::from_extension("MOV"), CaptureMode::Video);
        assert_eq!(CaptureMode::from_extension("jpg"), CaptureMode::Photo);
        assert_eq!(CaptureMode::from_extension(""), CaptureMode::Photo);
    }

    #[test]
    fn attachment_naming_follows_mode() {
        assert_eq!(CaptureMode::Photo.content_type(), "image/jpeg");
        assert_eq!(CaptureMode::Video.file_name(), "webcam-recording.webm");
    }

    #[test]
    fn unlabeled_device_falls_back_to_position() {
        let device = CameraDevice::new("cam-b", "");
        assert_eq!(device.display_label(1), "Camera 2");

        let labeled = CameraDevice::new("cam-a", "Front");
        assert_eq!(labeled.display_label(0), "Front");
    }
}
