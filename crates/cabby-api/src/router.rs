//! Route definitions for the Cabby HTTP and WebSocket API.
//!
//! REST routes are mounted under `/api`, WebSocket upgrades under `/ws`.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(notification_routes())
        .merge(ride_routes())
        .merge(health_routes());

    let ws_routes = Router::new()
        .route("/ws/notifications", get(handlers::ws::notifications_ws))
        .route("/ws/chat/{ride_id}", get(handlers::ws::chat_ws));

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Notification catch-up feed
fn notification_routes() -> Router<AppState> {
    Router::new().route("/notifications", get(handlers::notification::feed))
}

/// Ride status poll, conversation catch-up, lifecycle actions
fn ride_routes() -> Router<AppState> {
    Router::new()
        .route("/rides/{id}/status", get(handlers::ride::status))
        .route("/rides/{id}/messages", get(handlers::chat::messages))
        .route("/rides/{id}/accept", post(handlers::ride::accept))
        .route("/rides/{id}/start", post(handlers::ride::start))
        .route("/rides/{id}/complete", post(handlers::ride::complete))
        .route("/rides/{id}/cancel", post(handlers::ride::cancel))
}

/// Health endpoints
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Build CORS layer from configuration
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::Any;

    let cors_config = &state.config.server.cors;

    let mut cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    cors
}
