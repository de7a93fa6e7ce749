//! Main Entrypoint for the Podcast API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Building the orchestrator and the speech synthesizer.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use podcast_api::{
    bootstrap::{build_orchestrator, build_synthesizer, prompt_overrides},
    config::Config,
    router::create_router,
    state::AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Waits for `Ctrl+C`, then cancels `shutdown` so running episodes stop at
/// their next turn boundary.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = ?e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
    shutdown.cancel();
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
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Services ---
    let prompts = prompt_overrides(&config)?;
    let orchestrator = build_orchestrator(&config, &prompts)?;
    let synthesizer = build_synthesizer(&config);
    let shutdown = CancellationToken::new();

    let app_state = Arc::new(AppState {
        orchestrator: Arc::new(orchestrator),
        synthesizer,
        shutdown: shutdown.clone(),
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        collection = %config.index_collection,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown))
    .await?;

    info!("Server has shut down.");
    Ok(())
}
