//! # cabby-realtime
//!
//! Real-time event distribution for Cabby. Provides:
//!
//! - A topic registry addressing live connections by user or by ride
//!   conversation
//! - Connection session lifecycle (handshake, heartbeat, inbound commands,
//!   outbound push) with idempotent teardown
//! - The publisher invoked by business-logic handlers: persist first, then
//!   fan out to every live subscriber of the target topic
//! - Catch-up queries for clients that missed live delivery
//!
//! Fan-out is in-process only. Running more than one server instance would
//! require an external broker; that is out of scope here.

pub mod catchup;
pub mod channel;
pub mod connection;
pub mod message;
pub mod publisher;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use channel::registry::TopicRegistry;
pub use channel::types::TopicKey;
pub use connection::handle::{ConnectionHandle, ConnectionId, SendOutcome, SessionKind};
pub use connection::manager::ConnectionManager;
pub use publisher::Publisher;
pub use server::RealtimeEngine;

/// Number of unread notifications delivered as the one-shot catch-up burst
/// when an authenticated notification session connects. A deliberate fixed
/// bound, not configurable per request.
pub const UNREAD_BURST_LIMIT: i64 = 10;
