use super::state::CallStatus;
use serde::{Deserialize, Serialize};

/// Point-in-time view of a session for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current lifecycle status.
    pub status: CallStatus,

    /// Seconds the call has been (or was) live. Frozen once the session
    /// leaves the active state.
    pub elapsed_secs: u64,

    /// `minutes:seconds` rendering of `elapsed_secs`.
    pub elapsed: String,

    /// Whether the assistant is currently speaking.
    pub speaking: bool,

    /// Whether the learner's microphone is muted.
    pub muted: bool,

    /// Whether the recording indicator should be shown.
    pub recording: bool,

    /// Most recent user-visible error, if any.
    pub last_error: Option<String>,

    /// Number of finalized transcript entries accumulated so far.
    pub transcript_entries: usize,
}
