// lib.rs - Main library file that exports all modules
pub mod config;
pub mod groq_client;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod provider;
pub mod sse;

use axum::{Extension, Router};
use provider::CompletionProvider;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use config::AppConfig;
pub use groq_client::GroqClient;
pub use provider::{Completion, CompletionParams, ProviderError};

/// Shared across all request tasks. The provider handle is built once at startup.
pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::chat::chat_routes())
        .merge(handlers::status::status_routes())
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
