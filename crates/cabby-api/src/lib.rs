//! # cabby-api
//!
//! HTTP and WebSocket surface for Cabby built on Axum.
//!
//! Provides the WebSocket upgrade handlers for both realtime channels,
//! the polling fallback endpoints, the ride lifecycle endpoints, JWT
//! identity resolution, and `AppError` to HTTP mapping.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
