use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::recorder::recording_buffer::RecordingBuffer;
use crate::traits::camera_platform::{ChunkCallback, DeviceStream};

/// A clip assembled from a finished recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledClip {
    pub device_id: String,
    pub bytes: Vec<u8>,
    pub chunk_count: usize,
}

/// Drives the recording sub-protocol: start → chunk delivery → stop → assembly.
///
/// ```text
/// idle ──begin──→ recording ──begin_stop──→ finalizing ──complete_stop──→ idle
///                     │                         │
///                     └────────── abort ────────┴──→ idle (buffer discarded)
/// ```
///
/// The recorder owns the device stream for the whole recording. Chunks land in
/// a shared [`RecordingBuffer`]; the session only ever sees the assembled clip.
pub struct RecorderController<S: DeviceStream> {
    phase: RecorderPhase<S>,
}

enum RecorderPhase<S> {
    Idle,
    Recording(ActiveRecording<S>),
    Finalizing(Arc<Mutex<RecordingBuffer>>),
}

/// A recording in flight, handed out by [`RecorderController::begin_stop`] so
/// the finalize wait can run without the session lock.
pub struct ActiveRecording<S> {
    stream: S,
    buffer: Arc<Mutex<RecordingBuffer>>,
}

impl<S: DeviceStream> Default for RecorderController<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DeviceStream> RecorderController<S> {
    pub fn new() -> Self {
        Self {
            phase: RecorderPhase::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, RecorderPhase::Idle)
    }

    /// Bytes accumulated by the current recording, if any.
    pub fn buffered_bytes(&self) -> usize {
        match &self.phase {
            RecorderPhase::Idle => 0,
            RecorderPhase::Recording(active) => active.buffer.lock().len(),
            RecorderPhase::Finalizing(buffer) => buffer.lock().len(),
        }
    }

    /// Start recording on `stream`, which the recorder now owns.
    ///
    /// On failure the stream is closed and `RecorderUnavailable` returned.
    pub fn begin(&mut self, mut stream: S) -> Result<(), CaptureError> {
        if !self.is_idle() {
            stream.close();
            return Err(CaptureError::InvalidState("a recording is already active".into()));
        }

        let buffer = Arc::new(Mutex::new(RecordingBuffer::new()));
        let sink = Arc::clone(&buffer);
        let on_chunk: ChunkCallback = Arc::new(move |chunk: &[u8]| {
            if !sink.lock().append(chunk) {
                trace!("dropped chunk of {} bytes", chunk.len());
            }
        });

        if let Err(e) = stream.start_recording(on_chunk) {
            stream.close();
            return Err(match e {
                CaptureError::RecorderUnavailable(_) => e,
                other => CaptureError::RecorderUnavailable(other.to_string()),
            });
        }

        debug!("recording started on {}", stream.device_id());
        self.phase = RecorderPhase::Recording(ActiveRecording { stream, buffer });
        Ok(())
    }

    /// Hand the active recording out for finalization.
    pub fn begin_stop(&mut self) -> Result<ActiveRecording<S>, CaptureError> {
        match std::mem::replace(&mut self.phase, RecorderPhase::Idle) {
            RecorderPhase::Recording(active) => {
                self.phase = RecorderPhase::Finalizing(Arc::clone(&active.buffer));
                Ok(active)
            }
            other => {
                self.phase = other;
                Err(CaptureError::InvalidState("no active recording".into()))
            }
        }
    }

    /// Return to idle after a finalization handed out by `begin_stop` completed.
    pub fn complete_stop(&mut self) {
        if matches!(self.phase, RecorderPhase::Finalizing(_)) {
            self.phase = RecorderPhase::Idle;
        }
    }

    /// Abnormal stop: discard the buffer without assembling it.
    ///
    /// A finalization already running elsewhere observes the discard and
    /// yields `Cancelled`.
    pub fn abort(&mut self) {
        match std::mem::replace(&mut self.phase, RecorderPhase::Idle) {
            RecorderPhase::Idle => {}
            RecorderPhase::Recording(mut active) => {
                let dropped = {
                    let mut buffer = active.buffer.lock();
                    let dropped = buffer.len();
                    buffer.discard();
                    dropped
                };
                active.stream.abort_recording();
                active.stream.close();
                debug!("recording aborted, discarded {} bytes", dropped);
            }
            RecorderPhase::Finalizing(buffer) => {
                buffer.lock().discard();
                debug!("recording discarded while finalizing");
            }
        }
    }
}

impl<S: DeviceStream> ActiveRecording<S> {
    /// Wait for the platform's finalize signal, then assemble the clip.
    ///
    /// Every chunk emitted before the signal is part of the clip. The stream is
    /// closed in all cases.
    pub async fn finish(mut self, finalize_timeout: Duration) -> Result<AssembledClip, CaptureError> {
        let device_id = self.stream.device_id().to_string();
        let stopped = tokio::time::timeout(finalize_timeout, self.stream.stop_recording()).await;

        let failure = match stopped {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(match e {
                CaptureError::RecorderUnavailable(_) => e,
                other => CaptureError::RecorderUnavailable(other.to_string()),
            }),
            Err(_) => {
                warn!("recorder on {} did not finalize within {:?}", device_id, finalize_timeout);
                self.stream.abort_recording();
                Some(CaptureError::Timeout)
            }
        };
        self.stream.close();

        let mut buffer = self.buffer.lock();
        if buffer.is_discarded() {
            return Err(CaptureError::Cancelled);
        }
        if let Some(e) = failure {
            buffer.discard();
            return Err(e);
        }
        if buffer.is_empty() {
            buffer.discard();
            return Err(CaptureError::RecorderUnavailable("recording produced no data".into()));
        }

        let chunk_count = buffer.chunk_count();
        let bytes = buffer.assemble();
        Ok(AssembledClip {
            device_id,
            bytes,
            chunk_count,
        })
    }
}
