pub mod channel;
pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod session;

pub use channel::{
    ChannelEvent, ChannelFactory, StartRequest, TranscriptEvent, TranscriptKind, VoiceChannel,
    WireChannel, WireChannelConfig, WireChannelFactory,
};
pub use self::config::Config;
pub use error::SessionError;
pub use history::{FileHistorySink, SessionHistorySink, SessionRecord};
pub use http::{create_router, AppState};
pub use session::{
    CallStatus, CallTrigger, SessionContext, SessionSnapshot, Speaker, Transcript,
    TranscriptEntry, VoiceSessionController,
};
