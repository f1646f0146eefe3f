//! Blogicum - a small blogging site

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blogicum::{
    config::Config,
    db,
    web::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogicum=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Blogicum...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    let pending = db::migrations::pending_count(&pool).await?;
    if pending > 0 {
        tracing::info!("Applying {} database migrations", pending);
        db::migrations::run_migrations(&pool).await?;
    }
    tracing::info!("Database migrations completed");

    tokio::fs::create_dir_all(&config.media.path).await?;

    let state = AppState::new(pool, &config)?;

    // Expired sessions are also rejected on lookup; this only reclaims rows
    match state.user_service.cleanup_expired_sessions().await {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "Expired sessions removed"),
        Err(e) => tracing::warn!("Failed to clean up sessions: {}", e),
    }

    // Build router
    let app = web::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
