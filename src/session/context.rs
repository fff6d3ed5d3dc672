use crate::channel::StartRequest;
use serde::{Deserialize, Serialize};

/// Read-only configuration for one session attempt.
///
/// Supplied by the surrounding application when a session is created and
/// never mutated by the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Identifier of the companion this conversation belongs to; passed to
    /// the completion hook so history lands on the right companion.
    pub companion_id: String,

    /// Subject being tutored (e.g. "maths").
    pub subject: String,

    /// Topic within the subject (e.g. "derivatives").
    pub topic: String,

    /// Conversational style the assistant should adopt (e.g. "casual").
    pub style: String,

    /// Voice variant used for speech synthesis (e.g. "female").
    pub voice: String,

    /// Display name of the companion.
    pub companion_name: String,

    /// Display name of the learner.
    pub user_name: String,

    /// Avatar URL of the learner.
    pub user_avatar: String,
}

impl SessionContext {
    /// Build the start command payload for the voice channel. Only
    /// finalized transcripts are requested from the client event stream.
    pub fn start_request(&self) -> StartRequest {
        StartRequest {
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            style: self.style.clone(),
            voice: self.voice.clone(),
            client_events: vec!["transcript".to_string()],
        }
    }
}
