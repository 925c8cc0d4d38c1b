//! Subscription tracking: which connections are subscribed to which topics.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

/// Tracks connection-to-topic subscription mappings (reverse index).
///
/// Makes session teardown proportional to the session's own
/// subscriptions instead of a scan of every topic.
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    /// Connection ID → set of topic keys.
    conn_to_topics: DashMap<ConnectionId, HashSet<String>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self {
            conn_to_topics: DashMap::new(),
        }
    }

    /// Records a subscription.
    pub fn add(&self, conn_id: ConnectionId, topic: String) {
        self.conn_to_topics.entry(conn_id).or_default().insert(topic);
    }

    /// Removes a subscription.
    pub fn remove(&self, conn_id: ConnectionId, topic: &str) {
        if let Some(mut topics) = self.conn_to_topics.get_mut(&conn_id) {
            topics.remove(topic);
        }
    }

    /// Returns the number of subscriptions for a connection.
    pub fn count(&self, conn_id: ConnectionId) -> usize {
        self.conn_to_topics
            .get(&conn_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Removes all subscriptions for a connection, returning the topics it
    /// was subscribed to.
    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<String> {
        self.conn_to_topics
            .remove(&conn_id)
            .map(|(_, topics)| topics)
            .unwrap_or_default()
    }
}
