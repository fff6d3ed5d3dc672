//! External real-time voice channel boundary
//!
//! The managed voice API (audio transport, speech-to-text/text-to-speech,
//! inference) is an opaque collaborator. This module owns the interface the
//! session controller consumes: control commands out, a stream of lifecycle
//! and transcript events back. Channels are injected through a factory so
//! tests can substitute a scripted event source.

mod events;
mod wire;

pub use events::{ChannelEvent, TranscriptEvent, TranscriptKind};
pub use wire::{WireChannel, WireChannelConfig, WireChannelFactory};

use crate::error::SessionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Parameters sent with the start command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub subject: String,
    pub topic: String,
    pub style: String,
    pub voice: String,
    /// Client-side event classes the channel should deliver.
    pub client_events: Vec<String>,
}

/// Control surface of the managed voice API.
#[async_trait]
pub trait VoiceChannel: Send + Sync {
    /// Begin a session. Success means the start command was accepted; the
    /// call itself becomes live when the channel emits `CallStart`.
    async fn start(&self, request: StartRequest) -> Result<(), SessionError>;

    /// End the current session. Must not wait for the channel's
    /// acknowledgement.
    async fn stop(&self);

    /// Set the microphone mute state on the channel.
    async fn set_muted(&self, muted: bool);

    /// The channel's authoritative mute state.
    async fn is_muted(&self) -> bool;

    /// Subscribe to the channel's event stream.
    fn subscribe(&self) -> broadcast::Receiver<ChannelEvent>;
}

/// Creates a channel for each new session controller.
pub trait ChannelFactory: Send + Sync {
    fn create(&self) -> Arc<dyn VoiceChannel>;
}
