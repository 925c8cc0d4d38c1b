//! Connection manager: registration, topic fan-out and teardown.

use std::sync::Arc;
use std::time::Duration;

use cabby_core::config::RealtimeConfig;

use crate::channel::registry::TopicRegistry;
use crate::channel::types::TopicKey;

use super::handle::{ConnectionHandle, ConnectionId, SendOutcome, SessionKind};
use super::pool::ConnectionPool;

/// Owns the pool and the topic registry, and performs fan-out.
///
/// Publish snapshots the subscriber list and pushes to each handle;
/// dead handles are collected during the loop and swept after it, so a
/// closed connection never aborts delivery to the remaining subscribers
/// and teardown never mutates the set being iterated.
#[derive(Debug)]
pub struct ConnectionManager {
    pool: ConnectionPool,
    registry: TopicRegistry,
    buffer_size: usize,
    max_per_user: usize,
}

impl ConnectionManager {
    /// Creates a manager from the realtime configuration.
    pub fn new(config: &RealtimeConfig) -> Self {
        Self {
            pool: ConnectionPool::new(),
            registry: TopicRegistry::new(),
            buffer_size: config.channel_buffer_size,
            max_per_user: config.max_connections_per_user,
        }
    }

    /// Registers a connection and returns its handle plus the receiver
    /// end of its outbound queue.
    ///
    /// When a user exceeds the per-user connection cap, the oldest
    /// connection is evicted first.
    pub fn register(
        &self,
        user_id: Option<i64>,
        kind: SessionKind,
    ) -> (Arc<ConnectionHandle>, tokio::sync::mpsc::Receiver<String>) {
        if let Some(user_id) = user_id {
            let existing = self.pool.connections_for_user(user_id);
            if existing.len() >= self.max_per_user {
                // a cap of zero leaves nothing to evict
                if let Some(&oldest) = existing.first() {
                    tracing::warn!(
                        user_id,
                        conn_id = %oldest,
                        "Connection cap reached, evicting oldest connection"
                    );
                    self.unregister(oldest);
                }
            }
        }

        let (handle, rx) = ConnectionHandle::new(user_id, kind, self.buffer_size);
        let handle = Arc::new(handle);
        self.pool.insert(handle.clone());
        tracing::debug!(
            conn_id = %handle.id,
            user_id = ?user_id,
            kind = ?kind,
            "Connection registered"
        );
        (handle, rx)
    }

    /// Removes a connection from the pool and from every topic.
    /// Idempotent; safe to call from the fan-out sweep.
    pub fn unregister(&self, conn_id: ConnectionId) {
        self.registry.unsubscribe_all(conn_id);
        if self.pool.remove(conn_id).is_some() {
            tracing::debug!(conn_id = %conn_id, "Connection unregistered");
        }
    }

    /// Subscribes a connection to a topic.
    pub fn subscribe(&self, topic: &TopicKey, conn_id: ConnectionId) {
        self.registry.subscribe(topic, conn_id);
    }

    /// Unsubscribes a connection from a topic.
    pub fn unsubscribe(&self, topic: &TopicKey, conn_id: ConnectionId) {
        self.registry.unsubscribe(topic, conn_id);
    }

    /// Pushes a serialized frame to every subscriber of a topic.
    /// Returns the number of queues the frame was delivered to.
    pub fn publish(&self, topic: &TopicKey, payload: &str) -> usize {
        let subscribers = self.registry.subscribers(topic);
        let mut delivered = 0;
        let mut dead = Vec::new();

        for conn_id in subscribers {
            let Some(handle) = self.pool.get(conn_id) else {
                // stale registry entry, sweep it with the dead ones
                dead.push(conn_id);
                continue;
            };
            match handle.try_send(payload.to_string()) {
                SendOutcome::Sent => delivered += 1,
                SendOutcome::Dropped => {}
                SendOutcome::Closed => dead.push(conn_id),
            }
        }

        for conn_id in dead {
            tracing::debug!(conn_id = %conn_id, topic = %topic, "Sweeping dead connection");
            self.unregister(conn_id);
        }
        delivered
    }

    /// Unregisters connections idle past the timeout. Returns how many
    /// were reaped.
    pub fn sweep_idle(&self, timeout: Duration) -> usize {
        let idle = self.pool.idle_connections(timeout);
        let reaped = idle.len();
        for conn_id in idle {
            tracing::info!(conn_id = %conn_id, "Reaping idle connection");
            self.unregister(conn_id);
        }
        reaped
    }

    /// Looks up a live connection.
    pub fn get(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.pool.get(conn_id)
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.pool.len()
    }

    /// Subscriber count for a topic.
    pub fn subscriber_count(&self, topic: &TopicKey) -> usize {
        self.registry.subscriber_count(topic)
    }
}
