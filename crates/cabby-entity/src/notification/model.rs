//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::category::NotificationCategory;

/// A notification delivered to exactly one recipient user.
///
/// Immutable after creation except for `is_read`, which only ever
/// transitions false → true through the event store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier (monotonic, assigned by the store).
    pub id: i64,
    /// The recipient user. Notifications are owned exclusively by them.
    pub user_id: i64,
    /// Notification category (persisted string form of
    /// [`NotificationCategory`]).
    pub category: String,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Whether the recipient has read this notification.
    pub is_read: bool,
    /// Type of the related entity, if any (e.g. `"Ride"`).
    pub related_to_type: Option<String>,
    /// Identifier of the related entity, if any.
    pub related_to_id: Option<i64>,
    /// Optional URL to open when the notification is activated.
    pub action_url: Option<String>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Whether the notification is still unread.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }

    /// Compact `"<type>_<id>"` tag for the related entity, wire format of
    /// the `related_to` frame field.
    pub fn related_to(&self) -> Option<String> {
        match (&self.related_to_type, self.related_to_id) {
            (Some(t), Some(id)) => Some(format!("{t}_{id}")),
            _ => None,
        }
    }
}

/// Insertion payload for a notification; the store assigns id and
/// creation time.
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// Recipient user.
    pub user_id: i64,
    /// Category.
    pub category: NotificationCategory,
    /// Title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Related entity type, if any.
    pub related_to_type: Option<String>,
    /// Related entity id, if any.
    pub related_to_id: Option<i64>,
    /// Optional action URL.
    pub action_url: Option<String>,
}

impl NewNotification {
    /// Shorthand for a ride-tagged notification.
    pub fn for_ride(
        user_id: i64,
        category: NotificationCategory,
        title: impl Into<String>,
        message: impl Into<String>,
        ride_id: i64,
        action_url: Option<String>,
    ) -> Self {
        Self {
            user_id,
            category,
            title: title.into(),
            message: message.into(),
            related_to_type: Some("Ride".to_string()),
            related_to_id: Some(ride_id),
            action_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_to_tag() {
        let n = Notification {
            id: 1,
            user_id: 2,
            category: "RIDE_ACCEPTED".to_string(),
            title: "Ride Accepted".to_string(),
            message: "A driver has accepted your ride".to_string(),
            is_read: false,
            related_to_type: Some("Ride".to_string()),
            related_to_id: Some(42),
            action_url: None,
            created_at: Utc::now(),
        };
        assert_eq!(n.related_to().as_deref(), Some("Ride_42"));
        assert!(n.is_unread());
    }
}
