//! Server startup and shutdown logic.
//!
//! This module contains the `run_server` function which handles:
//! - CORS mapping registration
//! - Account store selection (PostgreSQL or in-memory)
//! - Migration running
//! - Router creation
//! - Server binding and graceful shutdown

use crate::config::{Config, DatabaseConfig};
use crate::cors::register_cors_mappings;
use crate::db::PgRepository;
use crate::error::{AppError, AppResult};
use crate::memory::MemoryStore;
use crate::routes;
use crate::state::AppState;
use crate::store::SharedStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Run the web server with the given configuration.
///
/// # Arguments
///
/// * `config` - The application configuration
/// * `should_migrate` - Whether to run database migrations on startup
///
/// # Errors
///
/// This function will return an error if:
/// - The CORS configuration is invalid
/// - Database connection or migration fails
/// - Server binding fails
/// - Server runtime error occurs
pub async fn run_server(config: Config, should_migrate: bool) -> AppResult<()> {
    info!("Starting banque server...");

    // Registered once; shared read-only by every request task
    let cors = Arc::new(register_cors_mappings(&config.cors)?);

    let store = open_store(&config.database, should_migrate).await?;
    let state = Arc::new(AppState { store });

    let app = routes::create_router(state, cors);

    let addr = config.server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(create_shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}

/// Open the configured account store.
///
/// Without a database URL the server keeps accounts in memory; they are lost on restart.
pub async fn open_store(database: &DatabaseConfig, should_migrate: bool) -> AppResult<SharedStore> {
    let Some(url) = &database.url else {
        warn!("DATABASE_URL not set, using in-memory account store");
        return Ok(Arc::new(MemoryStore::new()));
    };

    info!("Connecting to database...");
    let repository = PgRepository::new(
        url,
        database.max_connections,
        database.min_connections,
        database.acquire_timeout_seconds,
    )
    .await?;

    if should_migrate {
        info!("Running database migrations...");
        repository.run_migrations().await?;
        info!("Migrations completed successfully");
    }

    Ok(Arc::new(repository))
}

/// Create a future that resolves when a shutdown signal is received.
///
/// On Unix-like systems, this listens for both Ctrl+C (SIGINT) and SIGTERM.
/// On other platforms, it only listens for Ctrl+C.
///
/// # Panics
///
/// Panics if signal handler installation fails; without it graceful
/// shutdown is impossible.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_store_without_url_uses_memory() {
        let store = open_store(&DatabaseConfig::default(), true).await.unwrap();
        assert_eq!(store.backend(), "memory");
    }
}
