//! Employee Agreements Backend
//!
//! A REST backend for employee agreement records, stored as JSON documents in SQLite.

mod api;
mod config;
mod db;
mod errors;
mod models;
mod service;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use service::AgreementService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AgreementService>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Employee Agreements Backend");
    tracing::info!("Database: {}", config.database_url);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Maximum page size: {}", config.max_page_limit);

    // Open the document store; an unreachable store is logged, not fatal
    let repo = db::connect(&config.database_url).await?;
    match repo.ensure_schema().await {
        Ok(()) => tracing::info!("Connected to document store"),
        Err(e) => tracing::error!("Could not connect to document store: {}", e),
    }

    let service = AgreementService::new(Arc::new(repo), config.max_page_limit);
    let state = AppState {
        service: Arc::new(service),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/emps",
            get(api::list_agreements).post(api::create_agreement),
        )
        .route(
            "/emps/{id}",
            get(api::get_agreement)
                .patch(api::patch_agreement)
                .put(api::replace_agreement)
                .delete(api::delete_agreement),
        )
        // Health check
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests;
