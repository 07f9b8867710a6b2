//! Staffline server library logic.

pub mod api_auth;
pub mod api_events;
pub mod api_notifications;
pub mod api_ws;
pub mod config;
pub mod error;
pub mod middleware;

use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use staffline_broker::BroadcastHub;
use staffline_db::DbPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Broadcast hub fanning events out to WebSocket sessions.
    pub hub: BroadcastHub,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/broadcasting/auth",
            get(api_auth::broadcasting_auth_get).post(api_auth::broadcasting_auth_post),
        )
        .route(
            "/employee/notifications",
            get(api_notifications::list_handler),
        )
        .route(
            "/employee/notifications/mark-read",
            post(api_notifications::mark_read_handler),
        )
        .route(
            "/employee/notifications/mark-all-read",
            post(api_notifications::mark_all_read_handler),
        )
        .route("/api/events", post(api_events::ingest_handler))
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(api_ws::ws_handler))
        .merge(protected_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
