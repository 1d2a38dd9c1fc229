use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use speechbridge::{run_event_pump, AppState, Config, DispatchBridge, RoomRegistry, Translator};

#[derive(Debug, Parser)]
#[command(name = "speechbridge", about = "Real-time speech interpretation relay")]
struct Args {
    /// Configuration file, layered under SPEECHBRIDGE__ environment overrides
    #[arg(long, default_value = "config/speechbridge")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} starting", cfg.service.name);
    info!("recognition endpoint: {}", cfg.recognition.streaming_base);
    info!(
        "batching {}-{} sentences per translation ({})",
        cfg.buffer.target_sentences, cfg.buffer.max_sentences, cfg.translation.model
    );

    let bridge = Arc::new(DispatchBridge::new());
    let registry = Arc::new(RoomRegistry::new(
        cfg.recognition.clone(),
        cfg.buffer.limits(),
        bridge.clone(),
    ));
    let translator = Arc::new(Translator::new(cfg.translation.clone()));

    let events = bridge.channel();
    tokio::spawn(run_event_pump(registry.clone(), translator, events));

    let state = AppState::new(registry);
    let router = speechbridge::create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
