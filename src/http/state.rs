use crate::channel::ChannelFactory;
use crate::history::SessionHistorySink;
use crate::session::VoiceSessionController;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live session controllers (session_id → controller)
    pub sessions: Arc<RwLock<HashMap<String, Arc<VoiceSessionController>>>>,

    /// Builds a voice channel for each new session.
    pub channels: Arc<dyn ChannelFactory>,

    /// Where completed sessions are recorded.
    pub history: Arc<dyn SessionHistorySink>,
}

impl AppState {
    pub fn new(channels: Arc<dyn ChannelFactory>, history: Arc<dyn SessionHistorySink>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            channels,
            history,
        }
    }
}
