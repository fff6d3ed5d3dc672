/// Whether a transcript event carries a finalized or an interim utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptKind {
    /// Partial speech-to-text result; superseded by later events and never
    /// added to the transcript log.
    Interim,
    /// Complete utterance, safe to append.
    Final,
}

/// A transcript utterance as emitted by the channel.
///
/// The role is carried as the raw wire tag; payloads are untrusted, so the
/// adapter validates it before touching the transcript.
#[derive(Debug, Clone)]
pub struct TranscriptEvent {
    pub role: String,
    pub kind: TranscriptKind,
    pub text: String,
}

/// Events emitted by the external real-time channel.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The call went live.
    CallStart,
    /// The call ended on the channel side.
    CallEnd,
    /// A transcript utterance (interim or final).
    Transcript(TranscriptEvent),
    /// The assistant started speaking.
    SpeechStart,
    /// The assistant stopped speaking.
    SpeechEnd,
    /// The channel failed; the message is shown to the user.
    Error { message: String },
}
