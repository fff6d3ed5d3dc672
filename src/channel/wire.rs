//! WebSocket-backed voice channel
//!
//! Speaks the managed voice API's JSON protocol: `session.*` command frames
//! go out, lifecycle and transcript event frames come back. One task owns
//! the socket; dropping the command side makes it close the connection and
//! exit, so stopping never waits on a server round trip.

use super::{ChannelEvent, ChannelFactory, StartRequest, TranscriptEvent, TranscriptKind, VoiceChannel};
use crate::error::SessionError;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capacity of the event fan-out buffer.
const EVENT_BUFFER: usize = 64;

/// Connection settings for the voice API.
#[derive(Debug, Clone, Deserialize)]
pub struct WireChannelConfig {
    /// WebSocket endpoint of the voice API.
    pub endpoint: String,
    /// Bearer token. Empty means the deployment has no voice credentials.
    pub token: String,
}

/// Command frames sent to the voice API.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum WireCommand<'a> {
    #[serde(rename = "session.start")]
    Start {
        subject: &'a str,
        topic: &'a str,
        style: &'a str,
        voice: &'a str,
        #[serde(rename = "clientEvents")]
        client_events: &'a [String],
    },
    #[serde(rename = "session.stop")]
    Stop,
    #[serde(rename = "session.mute")]
    Mute { muted: bool },
}

/// Inbound frame shape. Every field beyond the tag is optional because the
/// payloads are untrusted.
#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(rename = "type")]
    kind: String,
    role: Option<String>,
    #[serde(rename = "transcriptType")]
    transcript_type: Option<String>,
    transcript: Option<String>,
    message: Option<String>,
}

/// Decode one text frame. `Ok(None)` means a frame type this client does
/// not consume.
fn decode_frame(text: &str) -> serde_json::Result<Option<ChannelEvent>> {
    let frame: WireFrame = serde_json::from_str(text)?;

    let event = match frame.kind.as_str() {
        "call-start" => Some(ChannelEvent::CallStart),
        "call-end" => Some(ChannelEvent::CallEnd),
        "speech-start" => Some(ChannelEvent::SpeechStart),
        "speech-end" => Some(ChannelEvent::SpeechEnd),
        "error" => Some(ChannelEvent::Error {
            message: frame
                .message
                .unwrap_or_else(|| "unknown channel error".to_string()),
        }),
        "transcript" => {
            let kind = match frame.transcript_type.as_deref() {
                Some("final") => TranscriptKind::Final,
                _ => TranscriptKind::Interim,
            };
            Some(ChannelEvent::Transcript(TranscriptEvent {
                role: frame.role.unwrap_or_default(),
                kind,
                text: frame.transcript.unwrap_or_default(),
            }))
        }
        _ => None,
    };

    Ok(event)
}

struct Link {
    commands: mpsc::UnboundedSender<Message>,
    task: JoinHandle<()>,
}

/// The production `VoiceChannel`: one WebSocket connection per live call.
pub struct WireChannel {
    config: WireChannelConfig,
    events: broadcast::Sender<ChannelEvent>,
    muted: AtomicBool,
    link: Mutex<Option<Link>>,
}

impl WireChannel {
    pub fn new(config: WireChannelConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            config,
            events,
            muted: AtomicBool::new(false),
            link: Mutex::new(None),
        }
    }

    fn lock_link(&self) -> MutexGuard<'_, Option<Link>> {
        self.link.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn send_command(&self, command: &WireCommand<'_>) {
        let frame = match serde_json::to_string(command) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("failed to encode voice command: {}", e);
                return;
            }
        };

        let link = self.lock_link();
        match link.as_ref() {
            Some(link) => {
                if link.commands.send(Message::Text(frame)).is_err() {
                    debug!("voice command dropped, connection already closed");
                }
            }
            None => debug!("voice command dropped, no live connection"),
        }
    }
}

#[async_trait]
impl VoiceChannel for WireChannel {
    async fn start(&self, request: StartRequest) -> Result<(), SessionError> {
        if self.config.token.trim().is_empty() {
            return Err(SessionError::Configuration(
                "voice API token is not set".to_string(),
            ));
        }

        {
            let mut link = self.lock_link();
            let live = link.as_ref().map(|l| !l.task.is_finished()).unwrap_or(false);
            if live {
                warn!("voice channel already has a live connection");
                return Ok(());
            }
            // Clear out any link whose task already exited (server closed).
            *link = None;
        }

        let mut ws_request = self
            .config
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| {
                SessionError::Configuration(format!("invalid voice API endpoint: {}", e))
            })?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.config.token))
            .map_err(|e| SessionError::Configuration(format!("invalid voice API token: {}", e)))?;
        ws_request.headers_mut().insert(AUTHORIZATION, bearer);

        let (stream, _) = connect_async(ws_request)
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))?;
        info!("connected to voice API at {}", self.config.endpoint);

        let (mut sink, source) = stream.split();

        let start_frame = serde_json::to_string(&WireCommand::Start {
            subject: &request.subject,
            topic: &request.topic,
            style: &request.style,
            voice: &request.voice,
            client_events: &request.client_events,
        })
        .map_err(|e| SessionError::Connection(format!("failed to encode start command: {}", e)))?;
        sink.send(Message::Text(start_frame))
            .await
            .map_err(|e| SessionError::Connection(format!("failed to send start command: {}", e)))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let events = self.events.clone();
        let task = tokio::spawn(run_link(sink, source, command_rx, events));

        *self.lock_link() = Some(Link {
            commands: command_tx,
            task,
        });
        Ok(())
    }

    async fn stop(&self) {
        let link = self.lock_link().take();
        if let Some(link) = link {
            if let Ok(frame) = serde_json::to_string(&WireCommand::Stop) {
                let _ = link.commands.send(Message::Text(frame));
            }
            // Dropping the command sender makes the link task close the
            // socket and exit on its own; no acknowledgement is awaited.
            drop(link.commands);
        }
        self.muted.store(false, Ordering::SeqCst);
    }

    async fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
        self.send_command(&WireCommand::Mute { muted });
    }

    async fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }
}

/// Own the socket until the command channel closes or the connection dies.
async fn run_link(
    mut sink: SplitSink<WsStream, Message>,
    mut source: SplitStream<WsStream>,
    mut commands: mpsc::UnboundedReceiver<Message>,
    events: broadcast::Sender<ChannelEvent>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(frame) => {
                    if sink.send(frame).await.is_err() {
                        warn!("voice connection lost while sending a command");
                        let _ = events.send(ChannelEvent::Error {
                            message: "voice connection lost".to_string(),
                        });
                        break;
                    }
                }
                // All command senders dropped: the session was stopped
                // locally. Close and go.
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => match decode_frame(&text) {
                    Ok(Some(event)) => {
                        let _ = events.send(event);
                    }
                    Ok(None) => debug!("ignoring unknown frame from voice API"),
                    Err(e) => warn!("undecodable frame from voice API: {}", e),
                },
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | None => {
                    info!("voice API closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("voice connection error: {}", e);
                    let _ = events.send(ChannelEvent::Error {
                        message: format!("voice connection error: {}", e),
                    });
                    break;
                }
            },
        }
    }
}

/// Hands out one `WireChannel` per session.
pub struct WireChannelFactory {
    config: WireChannelConfig,
}

impl WireChannelFactory {
    pub fn new(config: WireChannelConfig) -> Self {
        Self { config }
    }
}

impl ChannelFactory for WireChannelFactory {
    fn create(&self) -> Arc<dyn VoiceChannel> {
        Arc::new(WireChannel::new(self.config.clone()))
    }
}
