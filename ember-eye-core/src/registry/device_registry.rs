use crate::models::capture_models::CameraDevice;
use crate::models::error::CaptureError;

/// Available capture devices and the active selection.
///
/// The list is replaced wholesale on every enumeration.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<CameraDevice>,
    active: Option<String>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly enumerated list.
    ///
    /// The current selection survives if its id is still listed; otherwise the
    /// first device becomes active, or none when the list is empty.
    pub fn replace(&mut self, devices: Vec<CameraDevice>) {
        let keep = self
            .active
            .as_ref()
            .is_some_and(|id| devices.iter().any(|d| &d.id == id));
        if !keep {
            self.active = devices.first().map(|d| d.id.clone());
        }
        self.devices = devices;
    }

    /// Forget every device, e.g. after enumeration was denied.
    pub fn clear(&mut self) {
        self.devices.clear();
        self.active = None;
    }

    /// Make `id` the active device. Expected only while the session is idle.
    pub fn select(&mut self, id: &str) -> Result<(), CaptureError> {
        if !self.devices.iter().any(|d| d.id == id) {
            return Err(CaptureError::UnknownDevice(id.to_string()));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&CameraDevice> {
        let id = self.active.as_deref()?;
        self.devices.iter().find(|d| d.id == id)
    }

    /// The active id, or `NoActiveDevice` rather than a silent platform default.
    pub fn require_active(&self) -> Result<String, CaptureError> {
        self.active.clone().ok_or(CaptureError::NoActiveDevice)
    }
}
