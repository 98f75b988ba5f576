use std::sync::Arc;

use async_trait::async_trait;

use crate::models::capture_models::{CameraDevice, StreamOptions};
use crate::models::error::CaptureError;

/// Callback invoked with each binary chunk a recording emits.
///
/// Chunks must be delivered in emission order. The callback is synchronous
/// and cheap: it appends to the session's recording buffer.
pub type ChunkCallback = Arc<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// The device inventory of the host platform.
///
/// Implemented by:
/// - `ReplayPlatform` (directory-backed cameras, `ember-eye-replay`)
#[async_trait]
pub trait CameraPlatform: Send + Sync {
    type Stream: DeviceStream;

    /// List the capture devices currently available.
    ///
    /// Fails with `DeviceAccess` when permission is denied or enumeration fails.
    async fn enumerate(&self) -> Result<Vec<CameraDevice>, CaptureError>;

    /// Open a live stream on `device_id`.
    async fn open_stream(&self, device_id: &str, options: StreamOptions) -> Result<Self::Stream, CaptureError>;
}

/// An open stream on one device. Owned by exactly one reader at a time.
#[async_trait]
pub trait DeviceStream: Send {
    fn device_id(&self) -> &str;

    fn options(&self) -> StreamOptions;

    /// Grab one still frame.
    async fn grab_frame(&mut self) -> Result<Vec<u8>, CaptureError>;

    /// Begin recording, delivering chunks via `on_chunk` at the platform's own cadence.
    fn start_recording(&mut self, on_chunk: ChunkCallback) -> Result<(), CaptureError>;

    /// Ask the recording to finalize.
    ///
    /// Resolves only after the last chunk has been passed to the callback.
    async fn stop_recording(&mut self) -> Result<(), CaptureError>;

    /// Stop recording without waiting for pending chunks.
    fn abort_recording(&mut self);

    /// Release the underlying device handle.
    fn close(&mut self);
}
