//! # cabby-database
//!
//! PostgreSQL database connection management, the durable event store
//! (notifications and chat messages), and read-only repositories for the
//! external ride/user entities.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{EventStore, PgEventStore};
