//! Text chat front-end for the smart home assistant.

mod chat;

use anyhow::Context;
use clap::Parser;
use smarthome_core::{Config, SmartHomeAssistant, memory::DEFAULT_SESSION};
use tracing::{Level, info};

/// Chat with your smart home in English or Persian.
#[derive(Parser, Debug)]
#[command(name = "smarthome")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level; overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<Level>,

    /// Conversation session to use.
    #[arg(short, long, default_value = DEFAULT_SESSION)]
    session: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(args.log_level.unwrap_or(config.log_level))
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let assistant =
        SmartHomeAssistant::from_config(&config).context("Failed to initialize assistant")?;
    info!(session = %args.session, "Starting text chat");

    let outcome = chat::Chat::new(&assistant, args.session).run().await;

    let summary = assistant.shutdown().await;
    info!(%summary, "Smart Home Assistant shutdown complete");
    outcome
}
