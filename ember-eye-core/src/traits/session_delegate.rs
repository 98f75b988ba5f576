use crate::models::artifact::ArtifactMetadata;
use crate::models::detection::DetectionResult;
use crate::models::error::CaptureError;
use crate::models::state::SessionState;

/// Event delegate for capture session notifications.
///
/// Called after a transition has been applied, never for discarded stale
/// completions. Called with no session lock held.
pub trait SessionDelegate: Send + Sync {
    fn on_state_changed(&self, state: SessionState);

    fn on_error(&self, error: &CaptureError);

    fn on_artifact_ready(&self, metadata: &ArtifactMetadata);

    fn on_result(&self, result: &DetectionResult);
}
