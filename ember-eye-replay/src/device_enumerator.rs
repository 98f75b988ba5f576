//! Replay camera discovery.
//!
//! Every sub-directory of the replay root is one camera. The directory name is
//! the device id; an optional `label` file holds the display label.

use std::fs;
use std::path::{Path, PathBuf};

use ember_eye_core::models::capture_models::CameraDevice;
use ember_eye_core::models::error::CaptureError;

use crate::permissions::check_camera_access;

const LABEL_FILE: &str = "label";
const CLIP_FILE: &str = "clip.webm";
const FRAME_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

/// Camera enumerator over a replay root directory.
#[derive(Debug, Clone)]
pub struct DeviceEnumerator {
    root: PathBuf,
}

impl DeviceEnumerator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List cameras in directory-name order.
    pub fn list_devices(&self) -> Result<Vec<CameraDevice>, CaptureError> {
        check_camera_access(&self.root)?;

        let entries = fs::read_dir(&self.root)
            .map_err(|e| CaptureError::DeviceAccess(format!("{}: {}", self.root.display(), e)))?;

        let mut devices = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CaptureError::DeviceAccess(e.to_string()))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(id) = path.file_name().and_then(|n| n.to_str()) else {
                log::warn!("skipping camera directory with non UTF-8 name: {}", path.display());
                continue;
            };
            let label = fs::read_to_string(path.join(LABEL_FILE))
                .map(|l| l.trim().to_string())
                .unwrap_or_default();
            devices.push(CameraDevice::new(id, label));
        }

        devices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(devices)
    }

    /// Directory of a listed camera.
    pub fn device_dir(&self, id: &str) -> Result<PathBuf, CaptureError> {
        let dir = self.root.join(id);
        let traversal = matches!(id, "" | "." | "..") || id.contains(['/', '\\']);
        if traversal || !dir.is_dir() {
            return Err(CaptureError::DeviceAccess(format!("camera not found: {}", id)));
        }
        Ok(dir)
    }

    /// Frame files of a camera, in name order.
    pub fn frames(&self, id: &str) -> Result<Vec<PathBuf>, CaptureError> {
        let dir = self.device_dir(id)?;
        let entries = fs::read_dir(&dir)
            .map_err(|e| CaptureError::DeviceAccess(format!("{}: {}", dir.display(), e)))?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        frames.sort();
        Ok(frames)
    }

    /// The camera's recording source, if it has one.
    pub fn clip(&self, id: &str) -> Result<Option<PathBuf>, CaptureError> {
        let path = self.device_dir(id)?.join(CLIP_FILE);
        Ok(path.is_file().then_some(path))
    }
}
