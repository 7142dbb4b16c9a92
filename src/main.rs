use anyhow::Context;
use std::net::SocketAddr;

use blockgrid::{
    app::{build_router, cors_layer},
    config::Config,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    // Override with RUST_LOG, e.g. RUST_LOG=blockgrid=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blockgrid=info,tower_http=warn".into()),
        )
        .init();

    let config = Config::from_env().context("reading configuration")?;

    tracing::info!(
        "Block grid starting: {}x{} cells, environment={}",
        config.dimensions.rows,
        config.dimensions.cols,
        config.environment
    );

    let state = AppState::from_config(&config)?;
    tracing::info!(
        "Grid store ready with {} claimed blocks",
        state.grid.claimed_count()
    );

    let cors = cors_layer(&config.allowed_origins).context("parsing ALLOWED_ORIGINS")?;
    let app = build_router(state, cors);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("Shutting down block grid server");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
