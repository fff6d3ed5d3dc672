//! Session history persistence
//!
//! The completion side-effect: one record per normally completed session.
//! The sink is injected into the controller so the surrounding application
//! decides where history lands; the file sink below is the default.

use crate::session::TranscriptEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Record of one normally completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub companion_id: String,
    pub subject: String,
    pub topic: String,

    /// Final call duration in whole seconds.
    pub duration_secs: u64,

    /// Finalized utterances in arrival order.
    pub transcript: Vec<TranscriptEntry>,

    /// When the call ended.
    pub ended_at: DateTime<Utc>,
}

/// Destination for completed-session records.
#[async_trait]
pub trait SessionHistorySink: Send + Sync {
    async fn record_session(&self, record: &SessionRecord) -> Result<()>;
}

/// Writes one JSON file per completed session under a configured directory.
pub struct FileHistorySink {
    dir: PathBuf,
}

impl FileHistorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SessionHistorySink for FileHistorySink {
    async fn record_session(&self, record: &SessionRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.with_context(|| {
            format!("failed to create history directory {}", self.dir.display())
        })?;

        let file_name = format!(
            "session-{}-{}.json",
            record.companion_id,
            record.ended_at.format("%Y%m%dT%H%M%S%3f")
        );
        let path = self.dir.join(file_name);

        let json = serde_json::to_vec_pretty(record).context("failed to encode session record")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write session record {}", path.display()))?;

        info!("saved session history to {}", path.display());
        Ok(())
    }
}
