use scrobbles_server::aggregator::ScrobbleAggregator;
use scrobbles_server::config::ServerConfig;
use scrobbles_server::lastfm::LastFmClient;
use scrobbles_server::render::PreviewRenderer;
use scrobbles_server::web::{self, AppState};

use anyhow::Result;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Initialize logging
    let _logging_guard = scrobbles_server::logging::init_logging(
        &config.log_dir,
        "scrobbles-today",
        &config.log_level,
    )?;

    tracing::info!("Scrobbles.Today starting...");
    tracing::info!("Server will listen on {}", config.server_address());

    let api_key = config.api_key();
    if api_key.is_none() {
        tracing::warn!("No Last.fm API key configured, every lookup will report a failure");
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!("scrobbles-today/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let lastfm = LastFmClient::new(http.clone(), config.lastfm_api_url.clone());
    let aggregator = ScrobbleAggregator::new(Arc::new(lastfm), api_key);

    let renderer = PreviewRenderer::with_system_fonts();
    tracing::info!("Fallback font database holds {} faces", renderer.fallback_fonts().len());

    let state = Arc::new(AppState {
        aggregator,
        renderer,
        http,
        config: config.clone(),
    });
    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(config.server_address()).await?;
    tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received.");
        })
        .await?;

    Ok(())
}
