//! Main Entrypoint for the Smart Home API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Building the assistant and its collaborators.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and powering devices off on shutdown.

use anyhow::Context;
use smarthome_api::{router::create_router, state::AppState};
use smarthome_core::{Config, SmartHomeAssistant};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing assistant...");

    // --- 3. Initialize the Assistant ---
    let assistant = Arc::new(
        SmartHomeAssistant::from_config(&config).context("Failed to initialize assistant")?,
    );
    let app_state = Arc::new(AppState {
        assistant: assistant.clone(),
        config: Arc::new(config.clone()),
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        model = %config.home.llm.model,
        weather = config.weather_api_key.is_some(),
        news = config.news_api_key.is_some(),
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let summary = assistant.shutdown().await;
    info!(%summary, "Server has shut down.");
    Ok(())
}
