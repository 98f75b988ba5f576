//! Replay camera platform.
//!
//! Photos are read from the camera's frame files. Recordings stream the
//! camera's clip in fixed-size chunks from a dedicated thread, the way a
//! hardware recorder delivers encoded data at its own cadence.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use ember_eye_core::models::capture_models::{CameraDevice, StreamOptions};
use ember_eye_core::models::error::CaptureError;
use ember_eye_core::traits::camera_platform::{CameraPlatform, ChunkCallback, DeviceStream};

use crate::device_enumerator::DeviceEnumerator;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
const DEFAULT_CHUNK_INTERVAL: Duration = Duration::from_millis(100);

/// Camera platform backed by a replay root directory.
#[derive(Debug, Clone)]
pub struct ReplayPlatform {
    enumerator: DeviceEnumerator,
    chunk_size: usize,
    chunk_interval: Duration,
}

impl ReplayPlatform {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            enumerator: DeviceEnumerator::new(root),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_interval: DEFAULT_CHUNK_INTERVAL,
        }
    }

    /// Override the recording chunk size and delivery cadence.
    pub fn with_chunking(mut self, chunk_size: usize, chunk_interval: Duration) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.chunk_interval = chunk_interval;
        self
    }

    pub fn root(&self) -> &Path {
        self.enumerator.root()
    }
}

async fn blocking<T, F>(f: F) -> Result<T, CaptureError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CaptureError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CaptureError::DeviceAccess(format!("replay worker failed: {}", e)))?
}

#[async_trait]
impl CameraPlatform for ReplayPlatform {
    type Stream = ReplayStream;

    async fn enumerate(&self) -> Result<Vec<CameraDevice>, CaptureError> {
        let enumerator = self.enumerator.clone();
        let devices = blocking(move || enumerator.list_devices()).await?;
        log::debug!("{} replay camera(s) under {}", devices.len(), self.root().display());
        Ok(devices)
    }

    async fn open_stream(&self, device_id: &str, options: StreamOptions) -> Result<ReplayStream, CaptureError> {
        let enumerator = self.enumerator.clone();
        let id = device_id.to_string();
        let (frames, clip) = blocking(move || Ok((enumerator.frames(&id)?, enumerator.clip(&id)?))).await?;

        log::info!(
            "opened replay camera {} ({} frame(s), clip: {}, audio: {})",
            device_id,
            frames.len(),
            clip.is_some(),
            options.audio
        );
        Ok(ReplayStream {
            device_id: device_id.to_string(),
            options,
            frames,
            next_frame: 0,
            clip,
            chunk_size: self.chunk_size,
            chunk_interval: self.chunk_interval,
            recorder: None,
            closed: false,
        })
    }
}

/// Shared between a stream and its recorder thread.
struct RecorderControl {
    running: AtomicBool,
    discard: AtomicBool,
    failure: Mutex<Option<CaptureError>>,
}

struct RecorderThread {
    control: Arc<RecorderControl>,
    handle: thread::JoinHandle<()>,
}

/// An open replay camera.
pub struct ReplayStream {
    device_id: String,
    options: StreamOptions,
    frames: Vec<PathBuf>,
    next_frame: usize,
    clip: Option<PathBuf>,
    chunk_size: usize,
    chunk_interval: Duration,
    recorder: Option<RecorderThread>,
    closed: bool,
}

impl ReplayStream {
    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    fn signal_abort(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.control.discard.store(true, Ordering::SeqCst);
            recorder.control.running.store(false, Ordering::SeqCst);
            log::debug!("replay recording on {} aborted", self.device_id);
        }
    }
}

#[async_trait]
impl DeviceStream for ReplayStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn options(&self) -> StreamOptions {
        self.options
    }

    async fn grab_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
        if self.closed {
            return Err(CaptureError::DeviceAccess("stream is closed".into()));
        }
        if self.frames.is_empty() {
            return Err(CaptureError::DeviceAccess(format!(
                "camera {} has no frames",
                self.device_id
            )));
        }

        let path = self.frames[self.next_frame % self.frames.len()].clone();
        self.next_frame = (self.next_frame + 1) % self.frames.len();
        log::debug!("grabbing frame {}", path.display());
        blocking(move || {
            std::fs::read(&path).map_err(|e| CaptureError::DeviceAccess(format!("{}: {}", path.display(), e)))
        })
        .await
    }

    fn start_recording(&mut self, on_chunk: ChunkCallback) -> Result<(), CaptureError> {
        if self.closed {
            return Err(CaptureError::RecorderUnavailable("stream is closed".into()));
        }
        if self.recorder.is_some() {
            return Err(CaptureError::InvalidState("replay recording already running".into()));
        }
        let clip = self.clip.clone().ok_or_else(|| {
            CaptureError::RecorderUnavailable(format!("camera {} has no clip", self.device_id))
        })?;

        let control = Arc::new(RecorderControl {
            running: AtomicBool::new(true),
            discard: AtomicBool::new(false),
            failure: Mutex::new(None),
        });
        let worker_control = Arc::clone(&control);
        let chunk_size = self.chunk_size;
        let chunk_interval = self.chunk_interval;

        let handle = thread::Builder::new()
            .name("replay-recorder".into())
            .spawn(move || {
                if let Err(e) = replay_loop(&clip, chunk_size, chunk_interval, &worker_control, &on_chunk) {
                    log::error!("replay recording error: {}", e);
                    *worker_control.failure.lock() = Some(e);
                }
                worker_control.running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| CaptureError::RecorderUnavailable(format!("failed to spawn recorder thread: {}", e)))?;

        self.recorder = Some(RecorderThread { control, handle });
        Ok(())
    }

    async fn stop_recording(&mut self) -> Result<(), CaptureError> {
        let Some(recorder) = self.recorder.take() else {
            return Err(CaptureError::InvalidState("no replay recording running".into()));
        };
        recorder.control.running.store(false, Ordering::SeqCst);

        let handle = recorder.handle;
        tokio::task::spawn_blocking(move || handle.join())
            .await
            .map_err(|e| CaptureError::RecorderUnavailable(e.to_string()))?
            .map_err(|_| CaptureError::RecorderUnavailable("recorder thread panicked".into()))?;

        let failure = recorder.control.failure.lock().take();
        match failure {
            Some(e) => Err(e),
            None => {
                log::debug!("replay recording on {} finalized", self.device_id);
                Ok(())
            }
        }
    }

    fn abort_recording(&mut self) {
        self.signal_abort();
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.signal_abort();
        self.closed = true;
        log::debug!("closed replay camera {}", self.device_id);
    }
}

impl Drop for ReplayStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Recorder thread body.
///
/// Delivers `chunk_size` pieces of the clip every `chunk_interval` until the
/// clip is exhausted, then idles until stopped. Once stop is signalled the
/// unread remainder is flushed without pacing; an abort returns immediately.
fn replay_loop(
    clip: &Path,
    chunk_size: usize,
    chunk_interval: Duration,
    control: &RecorderControl,
    on_chunk: &ChunkCallback,
) -> Result<(), CaptureError> {
    let mut file = File::open(clip)
        .map_err(|e| CaptureError::RecorderUnavailable(format!("{}: {}", clip.display(), e)))?;
    let mut buf = vec![0u8; chunk_size];
    let mut exhausted = false;
    let mut delivered = 0usize;

    loop {
        if control.discard.load(Ordering::SeqCst) {
            return Ok(());
        }
        let stopping = !control.running.load(Ordering::SeqCst);

        if exhausted {
            if stopping {
                log::debug!("replay recorder delivered {} bytes", delivered);
                return Ok(());
            }
            thread::sleep(chunk_interval);
            continue;
        }

        let n = file
            .read(&mut buf)
            .map_err(|e| CaptureError::RecorderUnavailable(format!("{}: {}", clip.display(), e)))?;
        if n == 0 {
            exhausted = true;
            continue;
        }
        on_chunk(&buf[..n]);
        delivered += n;

        if !stopping {
            thread::sleep(chunk_interval);
        }
    }
}
