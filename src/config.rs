use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub voice: VoiceConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Managed voice API settings
#[derive(Debug, Deserialize)]
pub struct VoiceConfig {
    /// WebSocket endpoint of the voice API
    pub endpoint: String,

    /// Bearer token. Leave empty to run without voice credentials; sessions
    /// will then fail to start with a configuration error.
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryConfig {
    /// Directory where completed-session records are written
    pub path: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
