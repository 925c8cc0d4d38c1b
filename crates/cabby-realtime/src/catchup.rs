//! Catch-up queries for clients that missed live delivery.
//!
//! Backs the polling fallback endpoints. Ride status polling consumes
//! the pending unread notification so a message is delivered once over
//! either transport, never twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cabby_core::error::AppError;
use cabby_core::result::AppResult;
use cabby_database::repositories::RideDirectory;
use cabby_database::EventStore;
use cabby_entity::chat::ChatMessage;
use cabby_entity::ride::{Ride, RideRole};
use cabby_entity::user::{User, UserRole};

use crate::UNREAD_BURST_LIMIT;

/// Response of the ride status poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideStatusPoll {
    /// Current persisted ride status.
    pub status: String,
    /// When the ride row last changed.
    pub last_updated: DateTime<Utc>,
    /// Pending notification message, or the static per-status fallback.
    pub message: String,
    /// Role-appropriate dashboard redirect for terminal statuses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

/// One notification in the catch-up feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedNotification {
    /// Notification id.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Read flag.
    pub is_read: bool,
    /// Optional action URL.
    pub action_url: Option<String>,
}

/// Summary of the caller's currently active ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideUpdate {
    /// Ride id.
    pub id: i64,
    /// Current status.
    pub status: String,
    /// Always true; only active rides are summarized.
    pub is_active: bool,
    /// Short human-readable status line.
    pub status_message: String,
    /// Detail page for the ride.
    pub detail_url: String,
}

/// Response of the notification catch-up feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationFeed {
    /// Notifications newer than the watermark (or the unread digest).
    pub notifications: Vec<FeedNotification>,
    /// Active ride summary, empty when the caller has none.
    pub ride_updates: Vec<RideUpdate>,
    /// Server time, the client's next watermark.
    pub timestamp: DateTime<Utc>,
}

/// Current status of a ride for the polling fallback.
///
/// The requester must be a ride participant. If an unread ride-tagged
/// notification is pending it supplies the message and is marked read;
/// otherwise the static per-status message is used. COMPLETED and
/// CANCELLED rides carry a dashboard redirect matching the caller's role.
pub async fn poll_ride_status(
    store: &dyn EventStore,
    ride: &Ride,
    requester_id: i64,
) -> AppResult<RideStatusPoll> {
    let role = ride
        .role_of(requester_id)
        .ok_or_else(|| AppError::forbidden("Not authorized to view this ride"))?;
    let status = ride.parsed_status();

    let message = match store.unread_for_ride(requester_id, ride.id).await? {
        Some(notification) => {
            store
                .mark_notification_read(notification.id, requester_id)
                .await?;
            notification.message
        }
        None => status
            .map(|s| s.fallback_message().to_string())
            .unwrap_or_default(),
    };

    let redirect_url = match status {
        Some(s) if s.is_terminal() => Some(
            match role {
                RideRole::Rider => "/accounts/rider/dashboard/",
                RideRole::Driver => "/accounts/driver/dashboard/",
            }
            .to_string(),
        ),
        _ => None,
    };

    Ok(RideStatusPoll {
        status: ride.status.clone(),
        last_updated: ride.updated_at,
        message,
        redirect_url,
    })
}

/// Notification catch-up feed with an active-ride summary.
///
/// With a `since` watermark the filter is strict greater-than; without
/// one the caller gets its unread digest. Both are capped at the burst
/// limit, newest-first.
pub async fn notification_feed(
    store: &dyn EventStore,
    rides: &dyn RideDirectory,
    user: &User,
    since: Option<DateTime<Utc>>,
) -> AppResult<NotificationFeed> {
    let notifications = store
        .notifications_for_user(user.id, since, UNREAD_BURST_LIMIT)
        .await?
        .into_iter()
        .map(|n| FeedNotification {
            id: n.id,
            title: n.title,
            message: n.message,
            created_at: n.created_at,
            is_read: n.is_read,
            action_url: n.action_url,
        })
        .collect();

    let role = user.parsed_role().unwrap_or(UserRole::Rider);
    let ride_updates = rides
        .active_ride_for(user.id, role)
        .await?
        .into_iter()
        .map(|ride| RideUpdate {
            id: ride.id,
            status_message: ride
                .parsed_status()
                .map(|s| s.summary_message().to_string())
                .unwrap_or_else(|| ride.status.clone()),
            detail_url: format!("/rides/{}/", ride.id),
            status: ride.status,
            is_active: true,
        })
        .collect();

    Ok(NotificationFeed {
        notifications,
        ride_updates,
        timestamp: Utc::now(),
    })
}

/// Chronological conversation catch-up, participant-only.
///
/// Marks the counterparty's unread messages as read; fetching your
/// conversation is the read receipt.
pub async fn conversation_catchup(
    store: &dyn EventStore,
    ride: &Ride,
    requester_id: i64,
    after_id: Option<i64>,
) -> AppResult<Vec<ChatMessage>> {
    if !ride.is_participant(requester_id) {
        return Err(AppError::forbidden(
            "Not authorized to view this conversation",
        ));
    }
    let messages = store.conversation_messages(ride.id, after_id).await?;
    store.mark_messages_read(ride.id, requester_id).await?;
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use cabby_core::error::ErrorKind;
    use cabby_entity::chat::NewChatMessage;
    use cabby_entity::notification::{NewNotification, NotificationCategory};

    use crate::test_support::{sample_ride, sample_user, MemoryEventStore, StubRideDirectory};

    use super::*;

    #[tokio::test]
    async fn test_poll_consumes_pending_notification_exactly_once() {
        let store = MemoryEventStore::new();
        let ride = sample_ride(42, 1, Some(7), "ACCEPTED");
        store
            .append_notification(NewNotification::for_ride(
                1,
                NotificationCategory::RideAccepted,
                "Ride Accepted",
                "Driver X has accepted your ride",
                42,
                None,
            ))
            .await
            .expect("append");

        let first = poll_ride_status(&store, &ride, 1).await.expect("poll");
        assert_eq!(first.status, "ACCEPTED");
        assert_eq!(first.message, "Driver X has accepted your ride");
        assert!(first.redirect_url.is_none());

        // consumed: the second poll falls back to the static message
        let second = poll_ride_status(&store, &ride, 1).await.expect("poll");
        assert_eq!(second.message, "A driver has accepted your ride");
    }

    #[tokio::test]
    async fn test_poll_rejects_non_participant() {
        let store = MemoryEventStore::new();
        let ride = sample_ride(42, 1, Some(7), "STARTED");
        let err = poll_ride_status(&store, &ride, 9).await.expect_err("403");
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_poll_terminal_status_redirects_by_role() {
        let store = MemoryEventStore::new();
        let ride = sample_ride(42, 1, Some(7), "COMPLETED");

        let rider = poll_ride_status(&store, &ride, 1).await.expect("poll");
        assert_eq!(
            rider.redirect_url.as_deref(),
            Some("/accounts/rider/dashboard/")
        );

        let driver = poll_ride_status(&store, &ride, 7).await.expect("poll");
        assert_eq!(
            driver.redirect_url.as_deref(),
            Some("/accounts/driver/dashboard/")
        );
    }

    #[tokio::test]
    async fn test_feed_unread_digest_and_watermark() {
        let store = MemoryEventStore::new();
        let rides = StubRideDirectory::new();
        rides.insert(sample_ride(42, 1, None, "REQUESTED"));
        let user = sample_user(1, "rider1", "R", UserRole::Rider);

        let read = store
            .append_notification(NewNotification::for_ride(
                1,
                NotificationCategory::RideRequest,
                "Ride Requested",
                "old",
                42,
                None,
            ))
            .await
            .expect("append");
        store
            .mark_notification_read(read.id, 1)
            .await
            .expect("mark");
        let unread = store
            .append_notification(NewNotification::for_ride(
                1,
                NotificationCategory::RideAccepted,
                "Ride Accepted",
                "new",
                42,
                None,
            ))
            .await
            .expect("append");

        // no watermark: unread only
        let feed = notification_feed(&store, &rides, &user, None)
            .await
            .expect("feed");
        assert_eq!(feed.notifications.len(), 1);
        assert_eq!(feed.notifications[0].id, unread.id);
        assert_eq!(feed.ride_updates.len(), 1);
        assert_eq!(feed.ride_updates[0].status_message, "Waiting for driver");
        assert_eq!(feed.ride_updates[0].detail_url, "/rides/42/");

        // watermark before everything: both rows, read state ignored
        let since = read.created_at - chrono::Duration::seconds(1);
        let feed = notification_feed(&store, &rides, &user, Some(since))
            .await
            .expect("feed");
        assert_eq!(feed.notifications.len(), 2);
        // newest first
        assert_eq!(feed.notifications[0].id, unread.id);

        // watermark at the newest row: strict greater-than excludes it
        let feed = notification_feed(&store, &rides, &user, Some(unread.created_at))
            .await
            .expect("feed");
        assert!(feed.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_conversation_catchup_orders_and_marks_read() {
        let store = MemoryEventStore::new();
        let ride = sample_ride(42, 1, Some(7), "STARTED");
        for (sender, content) in [(1, "where are you"), (7, "around the corner"), (1, "ok")] {
            store
                .append_message(NewChatMessage {
                    ride_id: 42,
                    sender_id: sender,
                    content: content.to_string(),
                })
                .await
                .expect("append");
        }

        let all = conversation_catchup(&store, &ride, 7, None)
            .await
            .expect("catchup");
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));

        // rider's messages were marked read for the driver
        let after = conversation_catchup(&store, &ride, 7, Some(all[1].id))
            .await
            .expect("catchup");
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].content, "ok");
        assert!(after[0].is_read);

        let err = conversation_catchup(&store, &ride, 9, None)
            .await
            .expect_err("403");
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }
}
