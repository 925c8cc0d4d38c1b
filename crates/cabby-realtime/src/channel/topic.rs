//! Single topic with subscriber tracking.

use crate::connection::handle::ConnectionId;

/// A single topic with its current subscribers.
///
/// Subscribers are kept in registration order; within one topic, pushes
/// happen in that order.
#[derive(Debug, Clone)]
pub struct Topic {
    /// Topic key string.
    pub key: String,
    /// Subscribed connection IDs, oldest first.
    subscribers: Vec<ConnectionId>,
}

impl Topic {
    /// Creates a new empty topic.
    pub fn new(key: String) -> Self {
        Self {
            key,
            subscribers: Vec::new(),
        }
    }

    /// Adds a subscriber. A no-op if already subscribed.
    pub fn subscribe(&mut self, conn_id: ConnectionId) {
        if !self.subscribers.contains(&conn_id) {
            self.subscribers.push(conn_id);
        }
    }

    /// Removes a subscriber. A no-op if absent.
    pub fn unsubscribe(&mut self, conn_id: ConnectionId) {
        self.subscribers.retain(|id| *id != conn_id);
    }

    /// Returns subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns whether the topic has any subscribers.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Returns all subscriber connection IDs in registration order.
    pub fn get_subscribers(&self) -> Vec<ConnectionId> {
        self.subscribers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_subscribe_preserves_order_and_dedupes() {
        let mut topic = Topic::new("conversation:42".to_string());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        topic.subscribe(a);
        topic.subscribe(b);
        topic.subscribe(a);
        assert_eq!(topic.get_subscribers(), vec![a, b]);
    }

    #[test]
    fn test_unsubscribe_absent_is_noop() {
        let mut topic = Topic::new("user:1".to_string());
        topic.unsubscribe(Uuid::new_v4());
        assert!(topic.is_empty());
    }
}
