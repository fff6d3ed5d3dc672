use anyhow::Result;
use clap::Parser;
use companion_voice::{
    create_router, AppState, Config, FileHistorySink, WireChannelConfig, WireChannelFactory,
};
use std::sync::Arc;
use tracing::info;

/// Voice session service for AI learning companions
#[derive(Debug, Parser)]
#[command(name = "companion-voice")]
struct Args {
    /// Configuration file (without extension, config-crate style)
    #[arg(long, default_value = "config/companion-voice")]
    config: String,

    /// Override the HTTP port from the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;
    let port = args.port.unwrap_or(cfg.service.http.port);

    info!("{} starting", cfg.service.name);
    info!("voice API endpoint: {}", cfg.voice.endpoint);
    info!("session history path: {}", cfg.history.path);

    let channels = Arc::new(WireChannelFactory::new(WireChannelConfig {
        endpoint: cfg.voice.endpoint.clone(),
        token: cfg.voice.token.clone(),
    }));
    let history = Arc::new(FileHistorySink::new(cfg.history.path.clone()));
    let state = AppState::new(channels, history);

    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
