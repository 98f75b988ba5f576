use serde::Serialize;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// photo:  idle → captured ─┐
/// video:  idle → recording → recorded ─┤
///                                      ↓
///                 submitting → resulted / failed
///                     ↑                    │
///                     └──── retry ─────────┘
/// any state → idle (reset)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Captured,
    Recording,
    Recorded,
    Submitting,
    Resulted,
    Failed,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    /// States from which `submit()` may be issued.
    pub fn can_submit(&self) -> bool {
        matches!(self, Self::Captured | Self::Recorded | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Captured => "captured",
            Self::Recording => "recording",
            Self::Recorded => "recorded",
            Self::Submitting => "submitting",
            Self::Resulted => "resulted",
            Self::Failed => "failed",
        }
    }
}
