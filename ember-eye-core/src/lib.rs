//! # ember-eye-core
//!
//! Platform-agnostic capture → record → submit core for fire detection.
//!
//! Owns the device registry, the capture session state machine, the recorder
//! controller and the submission pipeline. Camera backends implement
//! [`CameraPlatform`]; detection transports implement [`DetectionClient`].
//!
//! ## Architecture
//!
//! ```text
//! ember-eye-core (this crate)
//! ├── traits/       ← CameraPlatform, DeviceStream, DetectionClient, SessionDelegate
//! ├── models/       ← CaptureError, SessionState, SessionConfiguration, Artifact, DetectionResult
//! ├── registry/     ← DeviceRegistry
//! ├── recorder/     ← RecorderController, RecordingBuffer
//! ├── submission/   ← SubmissionPipeline, HttpDetectionClient
//! └── session/      ← CaptureSession (generic orchestrator)
//! ```

pub mod models;
pub mod recorder;
pub mod registry;
pub mod session;
pub mod submission;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use models::artifact::{Artifact, ArtifactMetadata};
pub use models::capture_models::{CameraDevice, CaptureMode, StreamOptions};
pub use models::config::SessionConfiguration;
pub use models::detection::{Detection, DetectionResult};
pub use models::error::CaptureError;
pub use models::state::SessionState;
pub use recorder::controller::{AssembledClip, RecorderController};
pub use recorder::recording_buffer::RecordingBuffer;
pub use registry::device_registry::DeviceRegistry;
pub use session::capture::{CaptureSession, SessionSnapshot};
pub use submission::http_client::HttpDetectionClient;
pub use submission::pipeline::SubmissionPipeline;
pub use traits::camera_platform::{CameraPlatform, ChunkCallback, DeviceStream};
pub use traits::detection_client::{DetectionClient, DetectionRequest, ServiceResponse};
pub use traits::session_delegate::SessionDelegate;
