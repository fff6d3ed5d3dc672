use thiserror::Error;

/// Errors surfaced by the voice session controller and its collaborators.
///
/// Exactly one human-readable message is exposed to the UI at a time (the
/// most recent); starting a new session clears it.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A required voice API credential or endpoint is absent or unusable.
    /// Detected before any start command is issued.
    #[error("voice channel is not configured: {0}")]
    Configuration(String),

    /// The voice channel rejected a start command or failed mid-session.
    /// Terminal for the attempt; the caller may start a new one.
    #[error("voice connection failed: {0}")]
    Connection(String),

    /// The channel delivered an event the adapter could not make sense of.
    /// Never fatal to a running session.
    #[error("malformed channel event: {0}")]
    EventProcessing(String),

    /// The completed session could not be saved to history. The session
    /// itself still finished normally.
    #[error("failed to save session history: {0}")]
    Persistence(String),
}
