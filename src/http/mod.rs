//! HTTP API server for the web client
//!
//! This module provides a REST API for controlling voice sessions:
//! - POST /sessions - Create a session and start the call
//! - POST /sessions/:id/start - Retry/restart a session
//! - POST /sessions/:id/stop - End the call
//! - POST /sessions/:id/mute - Toggle the microphone
//! - GET /sessions/:id - Query the session snapshot
//! - GET /sessions/:id/transcript - Get the accumulated transcript
//! - DELETE /sessions/:id - Tear the session down
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
