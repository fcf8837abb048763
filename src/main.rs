//! Tipovacka Backend Service
//!
//! Main entry point for the Tipovacka sports prediction backend.
//! Boots configuration, the database pool and migrations, then holds the
//! core services ready for the API layer until shutdown.

use std::sync::Arc;

use tipovacka_backend::config::AppConfig;
use tipovacka_backend::database::{create_pool, run_migrations};
use tipovacka_backend::error::{AppError, AppResult};
use tipovacka_backend::AppState;
use tracing::{error, info};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    // Initialize tracing/logging with config
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("tipovacka_backend={},sqlx=warn", config.log_level).into()
            }),
        )
        .init();

    info!("Tipovacka backend service starting");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    // Run migrations
    info!("Running database migrations...");
    run_migrations(&pool, None).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::Database(e)
    })?;

    info!("Database migrations completed successfully");

    // =========================================================================
    // CORE SERVICES INITIALIZATION
    // =========================================================================
    info!("Initializing core services...");

    let app_state = Arc::new(AppState::new(pool, &config));
    info!("✓ Application state initialized with repositories and services");
    info!(
        "✓ Leaderboard cache ready (TTL {}s)",
        config.leaderboard_ttl_secs
    );

    // Keep a handle alive for the API layer mounted by the deployment
    let _state = app_state;

    // =========================================================================
    // READY
    // =========================================================================
    info!("Tipovacka backend service ready");
    info!("Press Ctrl+C to shutdown gracefully");

    tokio::signal::ctrl_c().await.map_err(|e| {
        AppError::Message(format!("Failed to listen for shutdown signal: {}", e))
    })?;

    info!("Shutdown signal received, shutting down gracefully...");
    info!("Tipovacka backend service shutdown complete");
    Ok(())
}
