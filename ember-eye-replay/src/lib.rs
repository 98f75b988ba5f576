//! # ember-eye-replay
//!
//! Replay camera backend for ember-eye.
//!
//! Provides:
//! - `ReplayPlatform` / `ReplayStream`: a [`CameraPlatform`] whose cameras are
//!   directories of recorded frames and clips
//! - `DeviceEnumerator`: camera discovery under the replay root
//! - `permissions`: access check on the replay root
//!
//! ## Layout
//! ```text
//! <root>/
//! ├── front-door/
//! │   ├── label          ← optional display label
//! │   ├── 0001.jpg       ← frames, cycled in name order
//! │   └── clip.webm      ← streamed in chunks while recording
//! └── garage/
//!     └── ...
//! ```
//!
//! ## Usage
//! ```ignore
//! use ember_eye_core::{CaptureSession, HttpDetectionClient, SessionConfiguration};
//! use ember_eye_replay::ReplayPlatform;
//!
//! let config = SessionConfiguration::default();
//! let client = HttpDetectionClient::new(&config)?;
//! let session = CaptureSession::new(ReplayPlatform::new("/var/lib/ember-eye/cameras"), client, config)?;
//! ```
//!
//! [`CameraPlatform`]: ember_eye_core::CameraPlatform

pub mod device_enumerator;
pub mod permissions;
pub mod replay_camera;

pub use device_enumerator::DeviceEnumerator;
pub use replay_camera::{ReplayPlatform, ReplayStream};
