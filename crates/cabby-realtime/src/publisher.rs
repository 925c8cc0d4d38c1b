//! The publisher: persist an event, then fan it out.
//!
//! Every emit entry point appends to the event store before any frame is
//! pushed. A `Database` error aborts the emit and no push fires; a dead
//! or slow subscriber never affects the caller.

use std::sync::Arc;

use cabby_core::error::AppError;
use cabby_core::result::AppResult;
use cabby_database::EventStore;
use cabby_entity::chat::{ChatMessage, NewChatMessage};
use cabby_entity::notification::{NewNotification, Notification, NotificationCategory};
use cabby_entity::ride::RideStatus;
use cabby_entity::user::User;

use crate::channel::types::TopicKey;
use crate::connection::manager::ConnectionManager;
use crate::message::types::{ChatFrame, OutboundFrame};

/// Publishes domain events: durable record first, live push second.
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn EventStore>,
    manager: Arc<ConnectionManager>,
}

impl Publisher {
    /// Creates a publisher over the given store and connection manager.
    pub fn new(store: Arc<dyn EventStore>, manager: Arc<ConnectionManager>) -> Self {
        Self { store, manager }
    }

    /// Persists a notification and pushes it to the recipient's live
    /// sessions.
    pub async fn emit_notification(&self, new: NewNotification) -> AppResult<Notification> {
        let recipient = new.user_id;
        let notification = self.store.append_notification(new).await?;

        let frame = OutboundFrame::notification_message(&notification);
        let delivered = self
            .manager
            .publish(&TopicKey::User(recipient), &frame.to_json());
        tracing::info!(
            notification_id = notification.id,
            user_id = recipient,
            delivered,
            "Notification emitted"
        );
        Ok(notification)
    }

    /// Persists a ride-tagged notification and pushes a
    /// `ride_status_update` frame to the recipient.
    ///
    /// The status string is validated against [`RideStatus`] before
    /// anything is written.
    pub async fn emit_ride_status(
        &self,
        recipient: i64,
        ride_id: i64,
        new_status: &str,
        message: impl Into<String>,
        driver: Option<&User>,
        redirect_url: Option<String>,
    ) -> AppResult<Notification> {
        let status = RideStatus::parse(new_status)
            .ok_or_else(|| AppError::validation(format!("Unknown ride status: {new_status}")))?;
        let message = message.into();

        let notification = self
            .store
            .append_notification(NewNotification::for_ride(
                recipient,
                NotificationCategory::for_ride_status(status),
                status.notification_title(),
                message.clone(),
                ride_id,
                redirect_url.clone(),
            ))
            .await?;

        let frame = OutboundFrame::RideStatusUpdate {
            ride_id,
            status: status.as_str().to_string(),
            driver_id: driver.map(|d| d.id),
            driver_name: driver.map(User::full_name),
            message,
            redirect_url,
        };
        let delivered = self
            .manager
            .publish(&TopicKey::User(recipient), &frame.to_json());
        tracing::info!(
            ride_id,
            status = %status,
            user_id = recipient,
            delivered,
            "Ride status emitted"
        );
        Ok(notification)
    }

    /// Persists a chat message and pushes it to every live subscriber of
    /// the ride's conversation, the sender's own sessions included.
    pub async fn emit_chat_message(
        &self,
        ride_id: i64,
        sender_id: i64,
        content: &str,
    ) -> AppResult<ChatMessage> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Message cannot be empty"));
        }

        let message = self
            .store
            .append_message(NewChatMessage {
                ride_id,
                sender_id,
                content: content.to_string(),
            })
            .await?;

        let frame = ChatFrame::Message {
            message: message.content.clone(),
            sender_id: message.sender_id,
            message_id: message.id,
            created_at: message.created_at,
        };
        let delivered = self
            .manager
            .publish(&TopicKey::Conversation(ride_id), &frame.to_json());
        tracing::debug!(
            ride_id,
            message_id = message.id,
            sender_id,
            delivered,
            "Chat message emitted"
        );
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use cabby_core::config::RealtimeConfig;
    use cabby_core::error::ErrorKind;

    use crate::connection::handle::SessionKind;
    use crate::test_support::{sample_user, MemoryEventStore};

    use super::*;

    fn setup() -> (Arc<MemoryEventStore>, Arc<ConnectionManager>, Publisher) {
        let store = Arc::new(MemoryEventStore::new());
        let manager = Arc::new(ConnectionManager::new(&RealtimeConfig {
            channel_buffer_size: 16,
            max_connections_per_user: 5,
            heartbeat_timeout_seconds: 90,
            sweep_interval_seconds: 30,
        }));
        let publisher = Publisher::new(store.clone(), manager.clone());
        (store, manager, publisher)
    }

    #[tokio::test]
    async fn test_emit_notification_persists_then_pushes() {
        let (store, manager, publisher) = setup();
        let (conn, mut rx) = manager.register(Some(1), SessionKind::Notifications);
        manager.subscribe(&TopicKey::User(1), conn.id);

        let notification = publisher
            .emit_notification(NewNotification::for_ride(
                1,
                NotificationCategory::RideAccepted,
                "Ride Accepted",
                "Driver X has accepted your ride",
                42,
                None,
            ))
            .await
            .expect("emit");

        assert_eq!(store.notification_count(), 1);
        let frame: serde_json::Value =
            serde_json::from_str(&rx.try_recv().expect("frame")).expect("json");
        assert_eq!(frame["type"], "notification_message");
        assert_eq!(frame["notification_id"], notification.id);
        assert_eq!(frame["related_to"], "Ride_42");
    }

    #[tokio::test]
    async fn test_failed_append_aborts_push() {
        let (store, manager, publisher) = setup();
        let (conn, mut rx) = manager.register(Some(1), SessionKind::Notifications);
        manager.subscribe(&TopicKey::User(1), conn.id);
        store.fail_appends();

        let err = publisher
            .emit_notification(NewNotification::for_ride(
                1,
                NotificationCategory::RideAccepted,
                "Ride Accepted",
                "x",
                42,
                None,
            ))
            .await
            .expect_err("must fail");

        assert_eq!(err.kind, ErrorKind::Database);
        assert_eq!(store.notification_count(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_emit_ride_status_carries_driver_identity() {
        let (_store, manager, publisher) = setup();
        let (conn, mut rx) = manager.register(Some(1), SessionKind::Notifications);
        manager.subscribe(&TopicKey::User(1), conn.id);
        let driver = sample_user(7, "xdriver", "X", cabby_entity::user::UserRole::Driver);

        let notification = publisher
            .emit_ride_status(
                1,
                42,
                "ACCEPTED",
                "Driver X has accepted your ride",
                Some(&driver),
                None,
            )
            .await
            .expect("emit");

        assert_eq!(notification.category, "RIDE_ACCEPTED");
        assert_eq!(notification.related_to().as_deref(), Some("Ride_42"));

        let frame: serde_json::Value =
            serde_json::from_str(&rx.try_recv().expect("frame")).expect("json");
        assert_eq!(frame["type"], "ride_status_update");
        assert_eq!(frame["driver_id"], 7);
        assert_eq!(frame["driver_name"], "X");
    }

    #[tokio::test]
    async fn test_emit_ride_status_rejects_unknown_status() {
        let (store, _manager, publisher) = setup();
        let err = publisher
            .emit_ride_status(1, 42, "ARRIVED", "x", None, None)
            .await
            .expect_err("must fail");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(store.notification_count(), 0);
    }

    #[tokio::test]
    async fn test_chat_message_reaches_all_conversation_subscribers() {
        let (_store, manager, publisher) = setup();
        let topic = TopicKey::Conversation(42);
        let (rider, mut rider_rx) = manager.register(Some(1), SessionKind::Chat { ride_id: 42 });
        let (driver, mut driver_rx) = manager.register(Some(7), SessionKind::Chat { ride_id: 42 });
        manager.subscribe(&topic, rider.id);
        manager.subscribe(&topic, driver.id);

        let first = publisher
            .emit_chat_message(42, 1, "I am at the corner")
            .await
            .expect("emit");
        let second = publisher
            .emit_chat_message(42, 7, "Two minutes away")
            .await
            .expect("emit");
        assert!(first.id < second.id);

        for rx in [&mut rider_rx, &mut driver_rx] {
            let a: serde_json::Value =
                serde_json::from_str(&rx.try_recv().expect("frame")).expect("json");
            let b: serde_json::Value =
                serde_json::from_str(&rx.try_recv().expect("frame")).expect("json");
            assert_eq!(a["message_id"], first.id);
            assert_eq!(a["sender_id"], 1);
            assert_eq!(b["message_id"], second.id);
            assert_eq!(b["sender_id"], 7);
        }
    }

    #[tokio::test]
    async fn test_empty_chat_message_is_rejected() {
        let (store, _manager, publisher) = setup();
        let err = publisher
            .emit_chat_message(42, 1, "   ")
            .await
            .expect_err("must fail");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(store.message_count(), 0);
    }
}
