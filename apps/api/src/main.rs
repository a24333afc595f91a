mod config;
mod enhancement;
mod errors;
mod llm_client;
mod models;
mod render;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::build_generator;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; malformed values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Enhancer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the model backend. A missing credential is not fatal: the service
    // still renders documents and reports itself unhealthy.
    let generator = build_generator(&config)?;
    if generator.is_configured() {
        info!(
            backend = generator.backend(),
            model = generator.model(),
            "Model backend initialized"
        );
    } else {
        warn!(
            backend = generator.backend(),
            "Model backend has no credential or endpoint; enhancement is disabled"
        );
    }

    let state = AppState::new(&config, generator);
    info!(
        sections = state.registry.ids().len(),
        concurrency = config.enhance_concurrency,
        deadline_secs = config.enhance_deadline.as_secs(),
        "Enhancer ready"
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
