use axum::{
    routing::{get, post},
    Router,
};
use installm_core::SessionManager;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod handlers;

pub type AppState = Arc<SessionManager>;

/// Routes for the chat page and its JSON API.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/api/models", get(handlers::list_models))
        .route("/api/load", post(handlers::load_model))
        .route("/api/generate", post(handlers::generate))
        .route("/api/history/:model", get(handlers::history))
        .route("/api/reset", post(handlers::reset))
        .route("/api/unload", post(handlers::unload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
