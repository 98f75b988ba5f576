//! Access check on the replay root.
//!
//! The replay root stands in for the platform's camera permission: a root that
//! is missing or cannot be listed behaves like a denied camera prompt.

use std::fs;
use std::path::Path;

use ember_eye_core::models::error::CaptureError;

/// Check that the replay root can be listed.
pub fn check_camera_access(root: &Path) -> Result<(), CaptureError> {
    let metadata = fs::metadata(root)
        .map_err(|e| CaptureError::DeviceAccess(format!("{}: {}", root.display(), e)))?;
    if !metadata.is_dir() {
        return Err(CaptureError::DeviceAccess(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    match fs::read_dir(root) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::warn!("camera access denied for {}: {}", root.display(), e);
            Err(CaptureError::DeviceAccess(format!("{}: {}", root.display(), e)))
        }
    }
}
