use super::adapter::EventAdapter;
use super::context::SessionContext;
use super::snapshot::SessionSnapshot;
use super::state::{CallStatus, CallTrigger};
use super::timer::{format_elapsed, SessionTimer};
use super::transcript::{Transcript, TranscriptEntry};
use crate::channel::VoiceChannel;
use crate::error::SessionError;
use crate::history::{SessionHistorySink, SessionRecord};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Mutable session state.
///
/// Single-writer: only the caller-facing commands and the event adapter
/// mutate it, always through the one mutex in `ControllerShared`.
pub(crate) struct SessionInner {
    pub(crate) status: CallStatus,
    pub(crate) transcript: Transcript,
    pub(crate) speaking: bool,
    pub(crate) muted: bool,
    pub(crate) recording: bool,
    pub(crate) last_error: Option<String>,
    /// Whether the completion hook has fired for the current attempt.
    pub(crate) history_recorded: bool,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            status: CallStatus::Inactive,
            transcript: Transcript::new(),
            speaking: false,
            muted: false,
            recording: false,
            last_error: None,
            history_recorded: false,
        }
    }

    /// Reset for a fresh attempt out of `Inactive`/`Finished`.
    fn reset_for_attempt(&mut self) {
        self.status = CallStatus::Connecting;
        self.transcript.clear();
        self.speaking = false;
        self.recording = false;
        self.last_error = None;
        self.history_recorded = false;
    }
}

/// State shared between the command surface and the event adapter.
pub(crate) struct ControllerShared {
    pub(crate) context: SessionContext,
    pub(crate) channel: Arc<dyn VoiceChannel>,
    pub(crate) history: Arc<dyn SessionHistorySink>,
    pub(crate) timer: SessionTimer,
    pub(crate) inner: Mutex<SessionInner>,
}

impl ControllerShared {
    /// Build the history record for the attempt that just finished. Must be
    /// called after the timer stopped so the duration is final.
    pub(crate) fn completed_record(&self, inner: &SessionInner) -> SessionRecord {
        SessionRecord {
            companion_id: self.context.companion_id.clone(),
            subject: self.context.subject.clone(),
            topic: self.context.topic.clone(),
            duration_secs: self.timer.elapsed_secs(),
            transcript: inner.transcript.snapshot(),
            ended_at: Utc::now(),
        }
    }

    /// Fire the completion hook on its own task. The `Finished` transition
    /// is already committed; a failed save only surfaces as the last error
    /// and never rolls the state back.
    pub(crate) fn spawn_history_record(shared: &Arc<ControllerShared>, record: SessionRecord) {
        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            if let Err(e) = shared.history.record_session(&record).await {
                error!("failed to save session history: {:#}", e);
                let mut inner = shared.inner.lock().await;
                inner.last_error =
                    Some(SessionError::Persistence(e.to_string()).to_string());
            }
        });
    }
}

/// Drives one voice conversation between a learner and their companion.
///
/// Owns the call lifecycle, the transcript log, the session clock, and the
/// completion side-effect; the surrounding application only issues commands
/// and renders snapshots. The channel and history sink are injected.
pub struct VoiceSessionController {
    shared: Arc<ControllerShared>,
    adapter: EventAdapter,
}

impl VoiceSessionController {
    /// Create a controller and bind it to the channel's event stream. The
    /// subscription is taken exactly once, before this returns, so no event
    /// emitted afterwards can be missed.
    pub fn new(
        context: SessionContext,
        channel: Arc<dyn VoiceChannel>,
        history: Arc<dyn SessionHistorySink>,
    ) -> Self {
        let shared = Arc::new(ControllerShared {
            context,
            channel,
            history,
            timer: SessionTimer::new(),
            inner: Mutex::new(SessionInner::new()),
        });
        let adapter = EventAdapter::bind(Arc::clone(&shared));

        Self { shared, adapter }
    }

    /// Begin a new session attempt.
    ///
    /// A no-op while an attempt is already connecting or active, so at most
    /// one start command reaches the channel per attempt. A rejected start
    /// lands back in `Inactive` with the error recorded; retrying is up to
    /// the caller.
    pub async fn start(&self) -> Result<(), SessionError> {
        {
            let mut inner = self.shared.inner.lock().await;
            if inner.status.transition(CallTrigger::Start).is_none() {
                warn!(
                    "session start ignored, attempt already in flight ({:?})",
                    inner.status
                );
                return Ok(());
            }
            inner.reset_for_attempt();
            self.shared.timer.reset();
        }

        info!(
            "starting voice session for companion {}",
            self.shared.context.companion_id
        );

        let request = self.shared.context.start_request();
        if let Err(e) = self.shared.channel.start(request).await {
            warn!("voice session failed to start: {}", e);
            let mut inner = self.shared.inner.lock().await;
            inner.status = CallStatus::Inactive;
            inner.recording = false;
            inner.last_error = Some(e.to_string());
            return Err(e);
        }

        Ok(())
    }

    /// End the current session.
    ///
    /// From `Active` this finishes the attempt; from `Connecting` it cancels
    /// the pending attempt back to `Inactive`. The local transition is
    /// committed before the stop command is issued and never waits for the
    /// channel's acknowledgement. Any other state is a no-op.
    pub async fn stop(&self) {
        let issued = {
            let mut inner = self.shared.inner.lock().await;
            match inner.status.transition(CallTrigger::Stop) {
                Some(next) => {
                    info!("stopping voice session ({:?} -> {:?})", inner.status, next);
                    inner.status = next;
                    inner.recording = false;
                    inner.speaking = false;
                    self.shared.timer.stop();
                    true
                }
                None => {
                    debug!("session stop ignored ({:?})", inner.status);
                    false
                }
            }
        };

        if issued {
            self.shared.channel.stop().await;
        }
    }

    /// Flip the microphone.
    ///
    /// The channel's mute state is authoritative: this reads it, flips it,
    /// writes it back, and mirrors the result into the cached flag, so the
    /// two cannot drift if the channel is muted through another path.
    /// Outside `Active` this is a no-op returning the cached flag.
    pub async fn toggle_mute(&self) -> bool {
        {
            let inner = self.shared.inner.lock().await;
            if inner.status != CallStatus::Active {
                debug!("mute toggle ignored outside active session");
                return inner.muted;
            }
        }

        let next = !self.shared.channel.is_muted().await;
        self.shared.channel.set_muted(next).await;

        let mut inner = self.shared.inner.lock().await;
        inner.muted = next;
        next
    }

    /// Point-in-time view of the session for rendering.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.shared.inner.lock().await;
        let elapsed_secs = self.shared.timer.elapsed_secs();

        SessionSnapshot {
            status: inner.status,
            elapsed_secs,
            elapsed: format_elapsed(elapsed_secs),
            speaking: inner.speaking,
            muted: inner.muted,
            recording: inner.recording,
            last_error: inner.last_error.clone(),
            transcript_entries: inner.transcript.len(),
        }
    }

    /// Ordered transcript of finalized utterances, oldest first.
    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.shared.inner.lock().await.transcript.snapshot()
    }

    pub fn context(&self) -> &SessionContext {
        &self.shared.context
    }

    /// Release the event subscription and the session clock. Both are also
    /// released when the controller is dropped, whatever state it is in.
    pub fn shutdown(&self) {
        self.adapter.unbind();
        self.shared.timer.stop();
    }
}
