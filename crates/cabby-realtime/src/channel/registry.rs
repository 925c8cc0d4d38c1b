//! Topic registry: manages all topics and subscriptions.

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

use super::subscription::SubscriptionTracker;
use super::topic::Topic;
use super::types::TopicKey;

/// Registry of all active topics.
///
/// Shared by every connection's subscribe/unsubscribe and read by every
/// publish. Empty topics are pruned so the map only ever holds topics
/// with at least one live subscriber.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    /// Topic key string → topic.
    topics: DashMap<String, Topic>,
    /// Subscription tracker (reverse index).
    subscriptions: SubscriptionTracker,
}

impl TopicRegistry {
    /// Creates a new topic registry.
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
            subscriptions: SubscriptionTracker::new(),
        }
    }

    /// Subscribes a connection to a topic.
    pub fn subscribe(&self, topic: &TopicKey, conn_id: ConnectionId) {
        let key = topic.to_string();
        self.topics
            .entry(key.clone())
            .or_insert_with(|| Topic::new(key.clone()))
            .subscribe(conn_id);

        self.subscriptions.add(conn_id, key);
    }

    /// Unsubscribes a connection from a topic. Idempotent: unsubscribing
    /// an absent handle is a no-op.
    pub fn unsubscribe(&self, topic: &TopicKey, conn_id: ConnectionId) {
        let key = topic.to_string();
        if let Some(mut entry) = self.topics.get_mut(&key) {
            entry.unsubscribe(conn_id);
        }
        // remove_if re-checks emptiness under the shard lock, so a
        // subscribe that lands between the guard drop and the prune
        // keeps its topic
        self.topics.remove_if(&key, |_, t| t.is_empty());
        self.subscriptions.remove(conn_id, &key);
    }

    /// Unsubscribes a connection from every topic it was added to.
    /// Idempotent; safe to call during or after fan-out sweeps.
    pub fn unsubscribe_all(&self, conn_id: ConnectionId) {
        let keys = self.subscriptions.remove_all(conn_id);
        for key in &keys {
            if let Some(mut entry) = self.topics.get_mut(key) {
                entry.unsubscribe(conn_id);
            }
            self.topics.remove_if(key, |_, t| t.is_empty());
        }
    }

    /// Returns all subscriber connection IDs for a topic, in registration
    /// order. A snapshot: fan-out iterates this copy, never the live set.
    pub fn subscribers(&self, topic: &TopicKey) -> Vec<ConnectionId> {
        self.topics
            .get(&topic.to_string())
            .map(|entry| entry.get_subscribers())
            .unwrap_or_default()
    }

    /// Returns subscriber count for a topic.
    pub fn subscriber_count(&self, topic: &TopicKey) -> usize {
        self.topics
            .get(&topic.to_string())
            .map(|entry| entry.subscriber_count())
            .unwrap_or(0)
    }

    /// Returns the number of subscriptions held by a connection.
    pub fn subscription_count(&self, conn_id: ConnectionId) -> usize {
        self.subscriptions.count(conn_id)
    }

    /// Returns total number of active topics.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let registry = TopicRegistry::new();
        let topic = TopicKey::User(1);
        let conn = Uuid::new_v4();

        registry.subscribe(&topic, conn);
        assert_eq!(registry.subscribers(&topic), vec![conn]);
        assert_eq!(registry.subscription_count(conn), 1);

        registry.unsubscribe(&topic, conn);
        assert!(registry.subscribers(&topic).is_empty());
        assert_eq!(registry.topic_count(), 0);
    }

    #[test]
    fn test_unsubscribe_absent_handle_is_noop() {
        let registry = TopicRegistry::new();
        let topic = TopicKey::Conversation(42);
        registry.unsubscribe(&topic, Uuid::new_v4());
        assert_eq!(registry.topic_count(), 0);
    }

    #[test]
    fn test_unsubscribe_all_releases_every_membership() {
        let registry = TopicRegistry::new();
        let conn = Uuid::new_v4();
        let other = Uuid::new_v4();

        registry.subscribe(&TopicKey::User(1), conn);
        registry.subscribe(&TopicKey::Conversation(42), conn);
        registry.subscribe(&TopicKey::Conversation(42), other);

        registry.unsubscribe_all(conn);

        assert_eq!(registry.subscription_count(conn), 0);
        assert!(registry.subscribers(&TopicKey::User(1)).is_empty());
        assert_eq!(
            registry.subscribers(&TopicKey::Conversation(42)),
            vec![other]
        );
        // calling again must be harmless
        registry.unsubscribe_all(conn);
    }

    #[tokio::test]
    async fn test_prune_never_clobbers_a_concurrent_subscribe() {
        let registry = Arc::new(TopicRegistry::new());
        let topic = TopicKey::User(9);
        let churner = Uuid::new_v4();
        let keeper = Uuid::new_v4();

        for _ in 0..100 {
            registry.subscribe(&topic, churner);

            let r1 = registry.clone();
            let leaving = tokio::spawn(async move { r1.unsubscribe(&topic, churner) });
            let r2 = registry.clone();
            let arriving = tokio::spawn(async move { r2.subscribe(&topic, keeper) });
            leaving.await.expect("task");
            arriving.await.expect("task");

            // the topic may have been emptied and pruned by the leaving
            // side, but the arriving subscription must survive either way
            assert!(registry.subscribers(&topic).contains(&keeper));
            registry.unsubscribe(&topic, keeper);
        }
    }

    #[tokio::test]
    async fn test_concurrent_subscribe_then_unsubscribe_leaves_no_trace() {
        let registry = Arc::new(TopicRegistry::new());
        let topic = TopicKey::Conversation(7);
        let conn = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.subscribe(&topic, conn);
                registry.unsubscribe(&topic, conn);
            }));
        }
        for h in handles {
            h.await.expect("task");
        }

        // unsubscribe ran last in every task; the handle must be gone
        registry.unsubscribe(&topic, conn);
        assert!(registry.subscribers(&topic).is_empty());
    }
}
