use anyhow::{Context, Result};
use astro_dashboard_backend::{create_router, AppState, Settings};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Starting Astro dashboard backend");

    let settings = Settings::from_env().context("Failed to load configuration")?;
    let port = settings.port;

    info!("Configuration:");
    info!("  DB host: {}", settings.db_host.as_deref().unwrap_or("<unset>"));
    info!("  Default database: {}", settings.default_database());
    info!("  Schema alias: {}", settings.schema);
    info!("  Pool max connections: {}", settings.pool.max_connections);
    info!("  Port: {}", port);

    // Requests report the gap with a Configuration Error body; the server still starts.
    let missing = settings.missing_variables();
    if !missing.is_empty() {
        warn!("Missing environment variables: {}", missing.join(", "));
    }

    let state = AppState::new(settings);
    let registry = Arc::clone(&state.registry);

    // Create router with middleware
    let app = create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start HTTP server
    let addr = format!("0.0.0.0:{}", port);
    info!("HTTP server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.close_all().await;
    info!("Database pools closed, bye");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
