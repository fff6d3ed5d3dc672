use serde::{Deserialize, Serialize};

/// Who produced a transcript utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Parse the role tag carried on channel transcript events. Payloads
    /// are untrusted, so anything unrecognized is `None`.
    pub fn from_wire(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Speaker::User),
            "assistant" => Some(Speaker::Assistant),
            _ => None,
        }
    }
}

/// A single finalized utterance. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub content: String,
}

/// Append-only chronological log of finalized utterances.
///
/// Entries are never reordered, mutated, or deduplicated; if the channel
/// delivers duplicate finals they are preserved as separate entries.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry at the end of the log. Amortized O(1).
    pub fn append(&mut self, speaker: Speaker, content: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker,
            content: content.into(),
        });
    }

    /// All entries in arrival order, oldest first.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Owned copy of the log for rendering or persistence.
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discard all entries. Only used when a new session attempt begins.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
