mod config;
mod errors;
mod letter;
mod llm_client;
mod render;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::letter::inputs::FsInputStore;
use crate::llm_client::LlmClient;
use crate::render::ChromiumRenderer;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cover Letter API v{}", env!("CARGO_PKG_VERSION"));

    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; generation requests will fail until it is configured");
    }

    let llm = LlmClient::new();
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let renderer = ChromiumRenderer::new(config.chrome_executable.clone());
    info!(
        "PDF renderer: headless Chromium ({})",
        config
            .chrome_executable
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "auto-detected".to_string())
    );

    let inputs = FsInputStore::new(config.defaults_dir.clone());
    info!(
        "Default resources: {}, uploads spooled to {}",
        config.defaults_dir.display(),
        config.upload_dir.display()
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        generator: Arc::new(llm),
        renderer: Arc::new(renderer),
        inputs: Arc::new(inputs),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
