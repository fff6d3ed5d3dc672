// Shared test doubles: a scripted voice channel and an in-memory history
// sink, so lifecycle and HTTP tests can drive the controller without a real
// voice API connection.

#![allow(dead_code)]

use async_trait::async_trait;
use companion_voice::{
    ChannelEvent, ChannelFactory, SessionContext, SessionError, SessionHistorySink, SessionRecord,
    StartRequest, VoiceChannel,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Commands the controller issued to the channel, in order.
#[derive(Debug, Clone)]
pub enum ChannelCommand {
    Start(StartRequest),
    Stop,
    SetMuted(bool),
}

/// A voice channel driven by the test: events are injected with `emit` and
/// every command is recorded.
pub struct ScriptedChannel {
    events: broadcast::Sender<ChannelEvent>,
    commands: Mutex<Vec<ChannelCommand>>,
    muted: AtomicBool,
    start_failure: Mutex<Option<SessionError>>,
}

impl ScriptedChannel {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            events,
            commands: Mutex::new(Vec::new()),
            muted: AtomicBool::new(false),
            start_failure: Mutex::new(None),
        })
    }

    /// Make the next start command fail with the given error.
    pub fn fail_next_start(&self, error: SessionError) {
        *self.start_failure.lock().unwrap() = Some(error);
    }

    /// Inject an event as if the voice API emitted it.
    pub fn emit(&self, event: ChannelEvent) {
        let _ = self.events.send(event);
    }

    /// Flip the authoritative mute state behind the controller's back, as
    /// if another path changed it on the channel.
    pub fn force_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<ChannelCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn start_count(&self) -> usize {
        self.commands()
            .iter()
            .filter(|c| matches!(c, ChannelCommand::Start(_)))
            .count()
    }

    pub fn stop_count(&self) -> usize {
        self.commands()
            .iter()
            .filter(|c| matches!(c, ChannelCommand::Stop))
            .count()
    }
}

#[async_trait]
impl VoiceChannel for ScriptedChannel {
    async fn start(&self, request: StartRequest) -> Result<(), SessionError> {
        if let Some(error) = self.start_failure.lock().unwrap().take() {
            return Err(error);
        }
        self.commands
            .lock()
            .unwrap()
            .push(ChannelCommand::Start(request));
        Ok(())
    }

    async fn stop(&self) {
        self.commands.lock().unwrap().push(ChannelCommand::Stop);
    }

    async fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
        self.commands
            .lock()
            .unwrap()
            .push(ChannelCommand::SetMuted(muted));
    }

    async fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }
}

/// Factory handing out one shared scripted channel, so the test keeps a
/// handle to the channel the controller talks to.
pub struct ScriptedChannelFactory {
    channel: Arc<ScriptedChannel>,
}

impl ScriptedChannelFactory {
    pub fn new(channel: Arc<ScriptedChannel>) -> Self {
        Self { channel }
    }
}

impl ChannelFactory for ScriptedChannelFactory {
    fn create(&self) -> Arc<dyn VoiceChannel> {
        Arc::clone(&self.channel) as Arc<dyn VoiceChannel>
    }
}

/// History sink collecting records in memory; can be told to fail.
pub struct RecordingSink {
    records: Mutex<Vec<SessionRecord>>,
    fail: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        })
    }

    pub fn fail_saves(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionHistorySink for RecordingSink {
    async fn record_session(&self, record: &SessionRecord) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("history backend unavailable");
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Give the controller's spawned tasks a chance to drain pending events.
/// Under a paused runtime clock this completes without real waiting.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

/// Advance roughly `n` seconds of session time, landing safely past the
/// timer's tick boundary so assertions never race a tick.
pub async fn advance_secs(n: u64) {
    tokio::time::sleep(Duration::from_millis(n * 1000 + 20)).await;
}

pub fn test_context() -> SessionContext {
    SessionContext {
        companion_id: "companion-42".to_string(),
        subject: "maths".to_string(),
        topic: "derivatives".to_string(),
        style: "casual".to_string(),
        voice: "female".to_string(),
        companion_name: "Neura".to_string(),
        user_name: "Sam".to_string(),
        user_avatar: "/avatars/sam.png".to_string(),
    }
}
