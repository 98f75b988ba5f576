//! In-memory platform, stream and transport doubles for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::models::artifact::ArtifactMetadata;
use crate::models::capture_models::{CameraDevice, StreamOptions};
use crate::models::detection::DetectionResult;
use crate::models::error::CaptureError;
use crate::models::state::SessionState;
use crate::traits::camera_platform::{CameraPlatform, ChunkCallback, DeviceStream};
use crate::traits::detection_client::{DetectionClient, DetectionRequest, ServiceResponse};
use crate::traits::session_delegate::SessionDelegate;

#[derive(Default)]
struct PlatformState {
    devices: Vec<CameraDevice>,
    enumerate_error: Option<CaptureError>,
    open_error: Option<CaptureError>,
    record_error: Option<CaptureError>,
    frame_error: Option<CaptureError>,
    opened: Vec<(String, StreamOptions)>,
    live_streams: usize,
    callback: Option<ChunkCallback>,
    final_chunks: Vec<Vec<u8>>,
    stop_gate: Option<Arc<Notify>>,
    frame_gate: Option<Arc<Notify>>,
}

/// Scriptable camera platform. Frames are `frame:<device id>`.
#[derive(Clone, Default)]
pub(crate) struct FakePlatform {
    state: Arc<Mutex<PlatformState>>,
}

impl FakePlatform {
    pub(crate) fn with_devices(ids: &[&str]) -> Self {
        let platform = Self::default();
        platform.set_devices(ids);
        platform
    }

    pub(crate) fn set_devices(&self, ids: &[&str]) {
        self.state.lock().devices = ids
            .iter()
            .map(|id| CameraDevice::new(*id, format!("{} camera", id)))
            .collect();
    }

    pub(crate) fn fail_enumeration(&self, error: CaptureError) {
        self.state.lock().enumerate_error = Some(error);
    }

    pub(crate) fn fail_open(&self, error: CaptureError) {
        self.state.lock().open_error = Some(error);
    }

    pub(crate) fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.enumerate_error = None;
        state.open_error = None;
        state.record_error = None;
    }

    /// Fail the next `grab_frame` only.
    pub(crate) fn fail_next_frame(&self, error: CaptureError) {
        self.state.lock().frame_error = Some(error);
    }

    pub(crate) fn fail_recording_start(&self, error: CaptureError) {
        self.state.lock().record_error = Some(error);
    }

    /// Deliver a chunk to the active recording, as the platform would.
    pub(crate) fn emit_chunk(&self, chunk: &[u8]) {
        let callback = self.state.lock().callback.clone();
        if let Some(callback) = callback {
            callback(chunk);
        }
    }

    /// A chunk still in flight when stop is requested; delivered before finalizing.
    pub(crate) fn queue_final_chunk(&self, chunk: &[u8]) {
        self.state.lock().final_chunks.push(chunk.to_vec());
    }

    /// Hold the next `stop_recording` open until the returned gate is notified.
    pub(crate) fn gate_stop(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().stop_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Hold the next `grab_frame` open until the returned gate is notified.
    pub(crate) fn gate_frames(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().frame_gate = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn open_stream_count(&self) -> usize {
        self.state.lock().live_streams
    }

    pub(crate) fn opened(&self) -> Vec<(String, StreamOptions)> {
        self.state.lock().opened.clone()
    }
}

#[async_trait]
impl CameraPlatform for FakePlatform {
    type Stream = FakeStream;

    async fn enumerate(&self) -> Result<Vec<CameraDevice>, CaptureError> {
        let state = self.state.lock();
        match &state.enumerate_error {
            Some(e) => Err(e.clone()),
            None => Ok(state.devices.clone()),
        }
    }

    async fn open_stream(&self, device_id: &str, options: StreamOptions) -> Result<FakeStream, CaptureError> {
        let mut state = self.state.lock();
        if let Some(e) = &state.open_error {
            return Err(e.clone());
        }
        if !state.devices.iter().any(|d| d.id == device_id) {
            return Err(CaptureError::DeviceAccess(format!("no such device: {}", device_id)));
        }
        state.opened.push((device_id.to_string(), options));
        state.live_streams += 1;
        Ok(FakeStream {
            device_id: device_id.to_string(),
            options,
            platform: Arc::clone(&self.state),
            closed: false,
        })
    }
}

pub(crate) struct FakeStream {
    device_id: String,
    options: StreamOptions,
    platform: Arc<Mutex<PlatformState>>,
    closed: bool,
}

#[async_trait]
impl DeviceStream for FakeStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn options(&self) -> StreamOptions {
        self.options
    }

    async fn grab_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
        let gate = self.platform.lock().frame_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(e) = self.platform.lock().frame_error.take() {
            return Err(e);
        }
        Ok(format!("frame:{}", self.device_id).into_bytes())
    }

    fn start_recording(&mut self, on_chunk: ChunkCallback) -> Result<(), CaptureError> {
        let mut state = self.platform.lock();
        if let Some(e) = state.record_error.take() {
            return Err(e);
        }
        state.callback = Some(on_chunk);
        Ok(())
    }

    async fn stop_recording(&mut self) -> Result<(), CaptureError> {
        let gate = self.platform.lock().stop_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let (callback, finals) = {
            let mut state = self.platform.lock();
            (state.callback.take(), std::mem::take(&mut state.final_chunks))
        };
        if let Some(callback) = callback {
            for chunk in finals {
                callback(&chunk);
            }
        }
        Ok(())
    }

    fn abort_recording(&mut self) {
        let mut state = self.platform.lock();
        state.callback = None;
        state.final_chunks.clear();
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.platform.lock().live_streams -= 1;
        }
    }
}

/// Scriptable detection transport.
#[derive(Default)]
pub(crate) struct FakeClient {
    responses: Mutex<VecDeque<Result<ServiceResponse, CaptureError>>>,
    requests: Mutex<Vec<DetectionRequest>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, status: u16, body: &str) {
        self.responses.lock().push_back(Ok(ServiceResponse {
            status,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub(crate) fn respond_ok(&self, detections: usize) {
        let records = vec![r#"{"class": "fire", "confidence": 0.9, "bbox": [1, 2, 3, 4]}"#; detections].join(",");
        self.respond(
            200,
            &format!(r#"{{"detections": [{}], "result_image": "/api/images/result.jpg"}}"#, records),
        );
    }

    pub(crate) fn fail(&self, error: CaptureError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Hold every `send` open until the returned gate is notified.
    pub(crate) fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn requests(&self) -> Vec<DetectionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DetectionClient for FakeClient {
    async fn send(&self, request: DetectionRequest) -> Result<ServiceResponse, CaptureError> {
        self.requests.lock().push(request);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(CaptureError::Network("no scripted response".into())))
    }
}

/// Delegate that records every notification as a short string.
#[derive(Default)]
pub(crate) struct RecordingDelegate {
    events: Mutex<Vec<String>>,
    counts: Mutex<HashMap<&'static str, usize>>,
}

impl RecordingDelegate {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub(crate) fn count(&self, kind: &'static str) -> usize {
        self.counts.lock().get(kind).copied().unwrap_or(0)
    }

    fn push(&self, kind: &'static str, event: String) {
        self.events.lock().push(event);
        *self.counts.lock().entry(kind).or_default() += 1;
    }
}

impl SessionDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: SessionState) {
        self.push("state", format!("state:{}", state.as_str()));
    }

    fn on_error(&self, error: &CaptureError) {
        self.push("error", format!("error:{}", error));
    }

    fn on_artifact_ready(&self, metadata: &ArtifactMetadata) {
        self.push("artifact", format!("artifact:{}", metadata.size_bytes));
    }

    fn on_result(&self, result: &DetectionResult) {
        self.push("result", format!("result:{}", result.detection_count()));
    }
}
