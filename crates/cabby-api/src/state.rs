//! Application state shared across all handlers.

use std::sync::Arc;

use sqlx::PgPool;

use cabby_core::config::AppConfig;
use cabby_database::repositories::{RideDirectory, RideRepository, UserDirectory, UserRepository};
use cabby_database::{EventStore, PgEventStore};
use cabby_realtime::{ConnectionManager, Publisher, RealtimeEngine};

use crate::auth::JwtDecoder;

/// Application state passed to every Axum handler via `State<AppState>`.
///
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// JWT token decoder.
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Durable event store.
    pub store: Arc<dyn EventStore>,
    /// Ride lookups.
    pub rides: Arc<dyn RideDirectory>,
    /// User lookups.
    pub users: Arc<dyn UserDirectory>,
    /// Realtime session engine.
    pub engine: Arc<RealtimeEngine>,
}

impl AppState {
    /// Wires the full dependency graph over a connected pool.
    pub fn new(config: Arc<AppConfig>, db_pool: PgPool) -> Self {
        let store: Arc<dyn EventStore> = Arc::new(PgEventStore::new(db_pool.clone()));
        let rides: Arc<dyn RideDirectory> = Arc::new(RideRepository::new(db_pool.clone()));
        let users: Arc<dyn UserDirectory> = Arc::new(UserRepository::new(db_pool.clone()));

        let manager = Arc::new(ConnectionManager::new(&config.realtime));
        let publisher = Publisher::new(store.clone(), manager.clone());
        let engine = Arc::new(RealtimeEngine::new(
            manager,
            publisher,
            store.clone(),
            rides.clone(),
            users.clone(),
        ));

        Self {
            jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
            config,
            db_pool,
            store,
            rides,
            users,
            engine,
        }
    }
}
