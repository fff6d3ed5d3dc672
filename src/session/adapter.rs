use super::controller::{ControllerShared, SessionInner};
use super::state::{CallStatus, CallTrigger};
use super::transcript::Speaker;
use crate::channel::{ChannelEvent, TranscriptEvent, TranscriptKind};
use crate::error::SessionError;
use crate::history::SessionRecord;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Binds the controller to the channel's event stream.
///
/// The subscription is taken exactly once per controller lifetime, and the
/// listening task is aborted on unbind/drop regardless of session state, so
/// no listener outlives the controller.
pub(crate) struct EventAdapter {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl EventAdapter {
    pub(crate) fn bind(shared: Arc<ControllerShared>) -> Self {
        // Subscribe before spawning so events emitted right after
        // construction cannot be missed.
        let mut events = shared.channel.subscribe();

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => apply_event(&shared, event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("voice event stream lagged, {} events dropped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self {
            task: Mutex::new(Some(task)),
        }
    }

    pub(crate) fn unbind(&self) {
        if let Some(task) = self.lock_task().take() {
            task.abort();
        }
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for EventAdapter {
    fn drop(&mut self) {
        self.unbind();
    }
}

/// Translate one channel event into a state transition or data mutation.
///
/// Payloads are untrusted: malformed ones become an observable last error,
/// never a fault, and never interrupt an otherwise healthy session. Events
/// arriving in a state where they mean nothing are ignored.
async fn apply_event(shared: &Arc<ControllerShared>, event: ChannelEvent) {
    match event {
        ChannelEvent::CallStart => {
            let mut inner = shared.inner.lock().await;
            match inner.status.transition(CallTrigger::CallStarted) {
                Some(next) => {
                    info!("voice call started");
                    inner.status = next;
                    inner.recording = true;
                    inner.last_error = None;
                    shared.timer.start();
                }
                None => debug!("ignoring call-start ({:?})", inner.status),
            }
        }
        ChannelEvent::CallEnd => {
            let record = {
                let mut inner = shared.inner.lock().await;
                handle_call_end(shared, &mut inner)
            };
            if let Some(record) = record {
                ControllerShared::spawn_history_record(shared, record);
            }
        }
        ChannelEvent::Transcript(event) => {
            let mut inner = shared.inner.lock().await;
            append_final_transcript(&mut inner, event);
        }
        ChannelEvent::SpeechStart => {
            shared.inner.lock().await.speaking = true;
        }
        ChannelEvent::SpeechEnd => {
            shared.inner.lock().await.speaking = false;
        }
        ChannelEvent::Error { message } => {
            let mut inner = shared.inner.lock().await;
            match inner.status.transition(CallTrigger::ChannelFailed) {
                Some(next) => {
                    warn!("voice session error: {}", message);
                    inner.status = next;
                    inner.recording = false;
                    inner.speaking = false;
                    inner.last_error = Some(message);
                    shared.timer.stop();
                }
                None => debug!("ignoring channel error outside a live session: {}", message),
            }
        }
    }
}

/// Completion policy: the hook fires exactly once per attempt that reached
/// `Active`, on the first call-end the channel delivers. That first call-end
/// may follow a local `stop()` (the state is already `Finished` then; the
/// event is the channel's acknowledgement of the disconnect). Repeats are
/// no-ops, as are call-ends for attempts that never went live.
fn handle_call_end(shared: &ControllerShared, inner: &mut SessionInner) -> Option<SessionRecord> {
    let finished = match inner.status.transition(CallTrigger::CallEnded) {
        Some(next) => {
            info!("voice call ended");
            inner.status = next;
            inner.recording = false;
            inner.speaking = false;
            shared.timer.stop();
            true
        }
        None => inner.status == CallStatus::Finished,
    };

    if finished && !inner.history_recorded {
        inner.history_recorded = true;
        Some(shared.completed_record(inner))
    } else {
        if !finished {
            debug!("ignoring call-end ({:?})", inner.status);
        }
        None
    }
}

/// Only finalized utterances with a recognizable speaker reach the log.
fn append_final_transcript(inner: &mut SessionInner, event: TranscriptEvent) {
    if event.kind != TranscriptKind::Final {
        return;
    }

    match Speaker::from_wire(&event.role) {
        Some(speaker) => inner.transcript.append(speaker, event.text),
        None => {
            let e = SessionError::EventProcessing(format!(
                "unknown speaker role {:?}",
                event.role
            ));
            warn!("{}", e);
            inner.last_error = Some(e.to_string());
        }
    }
}
