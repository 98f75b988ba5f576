use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::models::artifact::{Artifact, ArtifactMetadata};
use crate::models::capture_models::{CameraDevice, CaptureMode, StreamOptions};
use crate::models::config::SessionConfiguration;
use crate::models::detection::DetectionResult;
use crate::models::error::CaptureError;
use crate::models::state::SessionState;
use crate::recorder::controller::RecorderController;
use crate::registry::device_registry::DeviceRegistry;
use crate::submission::pipeline::SubmissionPipeline;
use crate::traits::camera_platform::{CameraPlatform, DeviceStream};
use crate::traits::detection_client::DetectionClient;
use crate::traits::session_delegate::SessionDelegate;

/// Async work issued from `Idle` that has not completed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp {
    CapturingPhoto,
    StartingRecording,
    StoppingRecording,
}

/// Internal mutable session state, protected by `parking_lot::Mutex`.
///
/// Never held across an `.await`.
struct SessionCore<S: DeviceStream> {
    mode: CaptureMode,
    state: SessionState,
    artifact: Option<Artifact>,
    result: Option<DetectionResult>,
    error: Option<CaptureError>,
    registry: DeviceRegistry,
    /// Stream held by the session between photo captures.
    stream: Option<S>,
    recorder: RecorderController<S>,
    pending: Option<PendingOp>,
    /// Bumped by every reset and mode switch; async completions tagged with an
    /// older generation are discarded.
    generation: u64,
}

/// Notifications gathered under the lock and delivered after it is released.
enum Notice {
    State(SessionState),
    Error(CaptureError),
    Artifact(ArtifactMetadata),
    Result(DetectionResult),
}

impl<S: DeviceStream> SessionCore<S> {
    fn new() -> Self {
        Self {
            mode: CaptureMode::default(),
            state: SessionState::Idle,
            artifact: None,
            result: None,
            error: None,
            registry: DeviceRegistry::new(),
            stream: None,
            recorder: RecorderController::new(),
            pending: None,
            generation: 0,
        }
    }

    fn transition(&mut self, state: SessionState, notices: &mut Vec<Notice>) {
        if self.state != state {
            debug!("session {} → {}", self.state.as_str(), state.as_str());
            self.state = state;
            notices.push(Notice::State(state));
        }
    }

    fn record_error(&mut self, error: CaptureError, notices: &mut Vec<Notice>) {
        self.result = None;
        self.error = Some(error.clone());
        notices.push(Notice::Error(error));
    }

    /// Back to `Idle`: abort any recording, drop artifact/result/error, and
    /// invalidate every in-flight completion.
    fn reset(&mut self, notices: &mut Vec<Notice>) {
        self.generation += 1;
        self.recorder.abort();
        self.pending = None;
        self.artifact = None;
        self.result = None;
        self.error = None;
        self.transition(SessionState::Idle, notices);
    }

    fn close_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("closing stream on {}", stream.device_id());
            stream.close();
        }
    }

    /// Common guard for operations that start from `Idle`.
    fn require_idle(&self, operation: &str) -> Result<(), CaptureError> {
        if !self.state.is_idle() || self.pending.is_some() {
            return Err(CaptureError::InvalidState(format!(
                "cannot {} while {}",
                operation,
                self.state.as_str()
            )));
        }
        Ok(())
    }
}

/// Read-only view of a session for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub mode: CaptureMode,
    pub state: SessionState,
    pub artifact: Option<ArtifactMetadata>,
    pub result: Option<DetectionResult>,
    pub error: Option<CaptureError>,
    pub active_device: Option<CameraDevice>,
    pub generation: u64,
    pub buffered_bytes: usize,
}

/// Capture → record → submit session, the aggregate root of the core.
///
/// Generic over the camera platform and the detection transport. All methods
/// take `&self`; share the session behind an `Arc` to reset it while another
/// operation is suspended.
///
/// ```text
/// [CameraPlatform] → stream ─┬→ grab_frame ───────────────→ Artifact (photo)
///                            └→ RecorderController → chunks → Artifact (clip)
///                                                               ↓
///                              SubmissionPipeline → DetectionClient → result / error
/// ```
pub struct CaptureSession<P: CameraPlatform, C: DetectionClient> {
    platform: P,
    pipeline: SubmissionPipeline<C>,
    config: SessionConfiguration,
    core: Mutex<SessionCore<P::Stream>>,
    delegate: Option<Arc<dyn SessionDelegate>>,
}

impl<P: CameraPlatform, C: DetectionClient> CaptureSession<P, C> {
    pub fn new(platform: P, client: C, config: SessionConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::Configuration)?;
        Ok(Self {
            platform,
            pipeline: SubmissionPipeline::new(client, &config),
            config,
            core: Mutex::new(SessionCore::new()),
            delegate: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn client(&self) -> &C {
        self.pipeline.client()
    }

    pub fn config(&self) -> &SessionConfiguration {
        &self.config
    }

    pub fn mode(&self) -> CaptureMode {
        self.core.lock().mode
    }

    pub fn state(&self) -> SessionState {
        self.core.lock().state
    }

    pub fn artifact(&self) -> Option<Artifact> {
        self.core.lock().artifact.clone()
    }

    pub fn result(&self) -> Option<DetectionResult> {
        self.core.lock().result.clone()
    }

    pub fn error(&self) -> Option<CaptureError> {
        self.core.lock().error.clone()
    }

    pub fn devices(&self) -> Vec<CameraDevice> {
        self.core.lock().registry.devices().to_vec()
    }

    pub fn active_device(&self) -> Option<CameraDevice> {
        self.core.lock().registry.active().cloned()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let core = self.core.lock();
        SessionSnapshot {
            mode: core.mode,
            state: core.state,
            artifact: core.artifact.as_ref().map(|a| a.metadata().clone()),
            result: core.result.clone(),
            error: core.error.clone(),
            active_device: core.registry.active().cloned(),
            generation: core.generation,
            buffered_bytes: core.recorder.buffered_bytes(),
        }
    }

    // --- Device registry ---

    /// Enumerate devices and replace the registry's list.
    ///
    /// The first device becomes active unless the current selection is still listed.
    pub async fn refresh_devices(&self) -> Result<Vec<CameraDevice>, CaptureError> {
        let listed = self.platform.enumerate().await.map_err(|e| match e {
            CaptureError::DeviceAccess(_) => e,
            other => CaptureError::DeviceAccess(other.to_string()),
        });

        let mut notices = Vec::new();
        let outcome = {
            let mut core = self.core.lock();
            match listed {
                Ok(devices) => {
                    core.registry.replace(devices.clone());
                    let keep_stream = match (&core.stream, core.registry.active_id()) {
                        (Some(stream), Some(active)) => stream.device_id() == active,
                        _ => false,
                    };
                    if !keep_stream {
                        core.close_stream();
                    }
                    info!(
                        "found {} camera(s), active: {}",
                        devices.len(),
                        core.registry.active_id().unwrap_or("none")
                    );
                    Ok(devices)
                }
                Err(e) => {
                    warn!("device enumeration failed: {}", e);
                    core.registry.clear();
                    core.close_stream();
                    if core.state.is_idle() {
                        core.record_error(e.clone(), &mut notices);
                    }
                    Err(e)
                }
            }
        };
        self.dispatch(notices);
        outcome
    }

    /// Make `id` the active device. Expected only while idle; not enforced.
    pub fn select_device(&self, id: &str) -> Result<(), CaptureError> {
        let mut core = self.core.lock();
        core.registry.select(id)?;
        if core.stream.as_ref().is_some_and(|s| s.device_id() != id) {
            core.close_stream();
        }
        debug!("selected device {}", id);
        Ok(())
    }

    // --- Mode ---

    /// Switch between photo and video.
    ///
    /// Outside a clean `Idle` this first resets the session, so no artifact
    /// survives under a different mode.
    pub fn set_mode(&self, mode: CaptureMode) {
        let mut notices = Vec::new();
        {
            let mut core = self.core.lock();
            let clean = core.state.is_idle()
                && core.pending.is_none()
                && core.artifact.is_none()
                && core.error.is_none();
            if !clean {
                core.reset(&mut notices);
            }
            if core.mode != mode {
                core.generation += 1;
                core.close_stream();
                core.mode = mode;
                info!("capture mode set to {:?}", mode);
            }
        }
        self.dispatch(notices);
    }

    // --- Photo ---

    /// Grab one frame from the active device. `Idle → Captured`.
    pub async fn capture_photo(&self) -> Result<Artifact, CaptureError> {
        let mut notices = Vec::new();
        let issued = {
            let mut core = self.core.lock();
            if core.mode != CaptureMode::Photo {
                return Err(CaptureError::InvalidState("photo capture requires photo mode".into()));
            }
            core.require_idle("capture a photo")?;
            match core.registry.require_active() {
                Ok(device_id) => {
                    core.pending = Some(PendingOp::CapturingPhoto);
                    core.error = None;
                    Ok((core.generation, device_id, core.stream.take()))
                }
                Err(e) => {
                    core.record_error(e.clone(), &mut notices);
                    Err(e)
                }
            }
        };
        let (generation, device_id, lease) = match issued {
            Ok(issued) => issued,
            Err(e) => {
                self.dispatch(notices);
                return Err(e);
            }
        };

        let options = StreamOptions { audio: false };
        let (stream, grabbed) = match self.acquire_stream(lease, &device_id, options).await {
            Ok(mut stream) => {
                let grabbed = stream.grab_frame().await;
                (Some(stream), grabbed)
            }
            Err(e) => (None, Err(e)),
        };

        let outcome = {
            let mut core = self.core.lock();
            if core.generation != generation {
                debug!("discarding photo from {} after reset", device_id);
                if let Some(mut stream) = stream {
                    stream.close();
                }
                return Err(CaptureError::Cancelled);
            }
            core.pending = None;
            // A stream that failed to deliver is not kept for the retry.
            let delivered = matches!(&grabbed, Ok(frame) if !frame.is_empty());
            if core.stream.is_none() && delivered {
                core.stream = stream;
            } else if let Some(mut stream) = stream {
                stream.close();
            }

            match grabbed {
                Ok(frame) if frame.is_empty() => {
                    let e = CaptureError::DeviceAccess("device returned an empty frame".into());
                    core.record_error(e.clone(), &mut notices);
                    Err(e)
                }
                Ok(frame) => {
                    let artifact = Artifact::photo(frame, &device_id);
                    info!("captured {} byte frame from {}", artifact.len(), device_id);
                    core.artifact = Some(artifact.clone());
                    core.result = None;
                    core.error = None;
                    notices.push(Notice::Artifact(artifact.metadata().clone()));
                    core.transition(SessionState::Captured, &mut notices);
                    Ok(artifact)
                }
                Err(e) => {
                    warn!("photo capture on {} failed: {}", device_id, e);
                    core.record_error(e.clone(), &mut notices);
                    Err(e)
                }
            }
        };
        self.dispatch(notices);
        outcome
    }

    // --- Video ---

    /// Open a recording stream on the active device. `Idle → Recording`.
    pub async fn start_recording(&self) -> Result<(), CaptureError> {
        let mut notices = Vec::new();
        let issued = {
            let mut core = self.core.lock();
            if core.mode != CaptureMode::Video {
                return Err(CaptureError::InvalidState("recording requires video mode".into()));
            }
            core.require_idle("start recording")?;
            match core.registry.require_active() {
                Ok(device_id) => {
                    core.pending = Some(PendingOp::StartingRecording);
                    core.error = None;
                    Ok((core.generation, device_id, core.stream.take()))
                }
                Err(e) => {
                    core.record_error(e.clone(), &mut notices);
                    Err(e)
                }
            }
        };
        let (generation, device_id, lease) = match issued {
            Ok(issued) => issued,
            Err(e) => {
                self.dispatch(notices);
                return Err(e);
            }
        };

        let options = StreamOptions {
            audio: self.config.record_audio,
        };
        let opened = self
            .acquire_stream(lease, &device_id, options)
            .await
            .map_err(|e| match e {
                CaptureError::RecorderUnavailable(_) => e,
                other => CaptureError::RecorderUnavailable(other.to_string()),
            });

        let outcome = {
            let mut core = self.core.lock();
            if core.generation != generation {
                debug!("discarding recording stream on {} after reset", device_id);
                if let Ok(mut stream) = opened {
                    stream.close();
                }
                return Err(CaptureError::Cancelled);
            }
            core.pending = None;

            match opened.and_then(|stream| core.recorder.begin(stream)) {
                Ok(()) => {
                    info!("recording on {}", device_id);
                    core.result = None;
                    core.transition(SessionState::Recording, &mut notices);
                    Ok(())
                }
                Err(e) => {
                    warn!("recording on {} failed to start: {}", device_id, e);
                    core.record_error(e.clone(), &mut notices);
                    Err(e)
                }
            }
        };
        self.dispatch(notices);
        outcome
    }

    /// Finalize the recording and install the assembled clip. `Recording → Recorded`.
    ///
    /// Waits for the recorder's finalize signal, so chunks already emitted when
    /// stop is requested are part of the clip.
    pub async fn stop_recording(&self) -> Result<Artifact, CaptureError> {
        let (generation, active) = {
            let mut core = self.core.lock();
            if !core.state.is_recording() || core.pending.is_some() {
                return Err(CaptureError::InvalidState(format!(
                    "cannot stop recording while {}",
                    core.state.as_str()
                )));
            }
            let active = core.recorder.begin_stop()?;
            core.pending = Some(PendingOp::StoppingRecording);
            (core.generation, active)
        };

        let finished = active.finish(self.config.finalize_timeout()).await;

        let mut notices = Vec::new();
        let outcome = {
            let mut core = self.core.lock();
            if core.generation != generation {
                debug!("discarding finalized recording after reset");
                return Err(CaptureError::Cancelled);
            }
            core.recorder.complete_stop();
            core.pending = None;

            match finished {
                Ok(clip) => {
                    let artifact = Artifact::clip(clip.bytes, &clip.device_id, clip.chunk_count);
                    info!(
                        "recorded {} bytes in {} chunk(s) from {}",
                        artifact.len(),
                        clip.chunk_count,
                        clip.device_id
                    );
                    core.artifact = Some(artifact.clone());
                    core.error = None;
                    notices.push(Notice::Artifact(artifact.metadata().clone()));
                    core.transition(SessionState::Recorded, &mut notices);
                    Ok(artifact)
                }
                Err(e) => {
                    warn!("recording failed to finalize: {}", e);
                    core.record_error(e.clone(), &mut notices);
                    core.transition(SessionState::Idle, &mut notices);
                    Err(e)
                }
            }
        };
        self.dispatch(notices);
        outcome
    }

    // --- Import ---

    /// Install an artifact that did not come from a device, such as an uploaded file.
    ///
    /// The session adopts the artifact's mode. `Idle → Captured/Recorded`.
    pub fn import_artifact(&self, artifact: Artifact) -> Result<(), CaptureError> {
        let mut notices = Vec::new();
        {
            let mut core = self.core.lock();
            core.require_idle("import an artifact")?;
            if core.mode != artifact.mode() {
                core.generation += 1;
                core.close_stream();
                core.mode = artifact.mode();
            }
            let state = match artifact.mode() {
                CaptureMode::Photo => SessionState::Captured,
                CaptureMode::Video => SessionState::Recorded,
            };
            notices.push(Notice::Artifact(artifact.metadata().clone()));
            core.artifact = Some(artifact);
            core.result = None;
            core.error = None;
            core.transition(state, &mut notices);
        }
        self.dispatch(notices);
        Ok(())
    }

    // --- Submission ---

    /// Submit the current artifact for detection.
    ///
    /// `Captured/Recorded/Failed → Submitting → Resulted/Failed`. The artifact is
    /// kept on failure so the caller can retry. A second call while submitting
    /// is rejected.
    pub async fn submit(&self) -> Result<DetectionResult, CaptureError> {
        let mut notices = Vec::new();
        let (generation, artifact) = {
            let mut core = self.core.lock();
            if core.state.is_submitting() {
                return Err(CaptureError::SubmissionInProgress);
            }
            if !core.state.can_submit() {
                return Err(CaptureError::InvalidState(format!(
                    "cannot submit while {}",
                    core.state.as_str()
                )));
            }
            let artifact = core
                .artifact
                .clone()
                .ok_or_else(|| CaptureError::InvalidState("nothing captured to submit".into()))?;
            core.result = None;
            core.error = None;
            core.transition(SessionState::Submitting, &mut notices);
            (core.generation, artifact)
        };
        self.dispatch(std::mem::take(&mut notices));

        let submitted = self.pipeline.submit(&artifact).await;

        let outcome = {
            let mut core = self.core.lock();
            if core.generation != generation {
                debug!("discarding stale submission of {}", artifact.metadata().id);
                return Err(CaptureError::Cancelled);
            }
            match submitted {
                Ok(result) => {
                    core.error = None;
                    core.result = Some(result.clone());
                    notices.push(Notice::Result(result.clone()));
                    core.transition(SessionState::Resulted, &mut notices);
                    Ok(result)
                }
                Err(e) => {
                    warn!("submission of {} failed: {}", artifact.metadata().id, e);
                    core.record_error(e.clone(), &mut notices);
                    core.transition(SessionState::Failed, &mut notices);
                    Err(e)
                }
            }
        };
        self.dispatch(notices);
        outcome
    }

    // --- Lifecycle ---

    /// Return to `Idle` from any state.
    ///
    /// An active recording is aborted and its chunks discarded. In-flight
    /// operations keep running but their completions are ignored.
    pub fn reset(&self) {
        let mut notices = Vec::new();
        {
            let mut core = self.core.lock();
            core.reset(&mut notices);
            debug!("session reset (generation {})", core.generation);
        }
        self.dispatch(notices);
    }

    /// Tear down: reset and release the device stream.
    pub fn shutdown(&self) {
        let mut notices = Vec::new();
        {
            let mut core = self.core.lock();
            core.reset(&mut notices);
            core.close_stream();
        }
        self.dispatch(notices);
        info!("capture session shut down");
    }

    // --- Internal helpers ---

    /// Reuse `lease` if it is open on `device_id` with `options`, otherwise
    /// close it before opening a new stream.
    async fn acquire_stream(
        &self,
        lease: Option<P::Stream>,
        device_id: &str,
        options: StreamOptions,
    ) -> Result<P::Stream, CaptureError> {
        if let Some(mut stream) = lease {
            if stream.device_id() == device_id && stream.options() == options {
                return Ok(stream);
            }
            debug!("closing stream on {}", stream.device_id());
            stream.close();
        }
        debug!("opening stream on {} (audio: {})", device_id, options.audio);
        self.platform.open_stream(device_id, options).await
    }

    fn dispatch(&self, notices: Vec<Notice>) {
        let Some(delegate) = &self.delegate else {
            return;
        };
        for notice in notices {
            match notice {
                Notice::State(state) => delegate.on_state_changed(state),
                Notice::Error(error) => delegate.on_error(&error),
                Notice::Artifact(metadata) => delegate.on_artifact_ready(&metadata),
                Notice::Result(result) => delegate.on_result(&result),
            }
        }
    }
}
