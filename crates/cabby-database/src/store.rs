//! The durable event store: notifications and chat messages.
//!
//! The [`EventStore`] trait is the persistence contract the publisher and
//! the connection sessions are written against; [`PgEventStore`] is the
//! production implementation. A failed append is fatal for the triggering
//! business action: the realtime push for an event must never fire unless
//! the event is durably recorded first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cabby_core::error::{AppError, ErrorKind};
use cabby_core::result::AppResult;
use cabby_entity::chat::{ChatMessage, NewChatMessage};
use cabby_entity::notification::{NewNotification, Notification};

/// Durable, queryable record of notifications and chat messages.
///
/// Ordering contract: notification queries return newest-first, chat
/// queries chronological (ascending id). `since`-style filters are strict
/// greater-than. All read mutations are owner-scoped; a miss is
/// `NotFound` without revealing whether the row exists for someone else.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a notification, returning the stored row with its assigned
    /// id and creation time.
    async fn append_notification(&self, new: NewNotification) -> AppResult<Notification>;

    /// Persist a chat message, returning the stored row.
    async fn append_message(&self, new: NewChatMessage) -> AppResult<ChatMessage>;

    /// Notifications for a user, newest-first, capped at `limit`.
    ///
    /// With a `since` watermark the filter is `created_at > since` over all
    /// notifications; without one it is "unread only": a client with no
    /// watermark gets an unread digest rather than full history.
    async fn notifications_for_user(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> AppResult<Vec<Notification>>;

    /// The most recent unread notification tied to a ride for this user.
    async fn unread_for_ride(&self, user_id: i64, ride_id: i64)
        -> AppResult<Option<Notification>>;

    /// Flip `is_read` to true on the recipient's own notification and
    /// return the updated row. `NotFound` if the id does not exist *or*
    /// belongs to another user.
    async fn mark_notification_read(
        &self,
        notification_id: i64,
        user_id: i64,
    ) -> AppResult<Notification>;

    /// Messages of one conversation in chronological order, optionally
    /// only those with id greater than `after_id`.
    async fn conversation_messages(
        &self,
        ride_id: i64,
        after_id: Option<i64>,
    ) -> AppResult<Vec<ChatMessage>>;

    /// Mark every unread message in the conversation not sent by `reader_id`
    /// as read. Returns the number of rows updated.
    async fn mark_messages_read(&self, ride_id: i64, reader_id: i64) -> AppResult<u64>;
}

/// PostgreSQL-backed event store.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Create a new event store over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn append_notification(&self, new: NewNotification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (user_id, category, title, message, related_to_type, related_to_id, action_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(new.user_id)
        .bind(new.category.as_str())
        .bind(&new.title)
        .bind(&new.message)
        .bind(&new.related_to_type)
        .bind(new.related_to_id)
        .bind(&new.action_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append notification", e))
    }

    async fn append_message(&self, new: NewChatMessage) -> AppResult<ChatMessage> {
        sqlx::query_as::<_, ChatMessage>(
            "INSERT INTO chat_messages (ride_id, sender_id, content) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(new.ride_id)
        .bind(new.sender_id)
        .bind(&new.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append chat message", e))
    }

    async fn notifications_for_user(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let query = match since {
            Some(since) => sqlx::query_as::<_, Notification>(
                "SELECT * FROM notifications WHERE user_id = $1 AND created_at > $2 \
                 ORDER BY created_at DESC LIMIT $3",
            )
            .bind(user_id)
            .bind(since)
            .bind(limit),
            None => sqlx::query_as::<_, Notification>(
                "SELECT * FROM notifications WHERE user_id = $1 AND is_read = FALSE \
                 ORDER BY created_at DESC LIMIT $2",
            )
            .bind(user_id)
            .bind(limit),
        };

        query.fetch_all(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list notifications", e)
        })
    }

    async fn unread_for_ride(
        &self,
        user_id: i64,
        ride_id: i64,
    ) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE user_id = $1 AND related_to_type = 'Ride' AND related_to_id = $2 \
               AND is_read = FALSE \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(ride_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query ride notifications", e)
        })
    }

    async fn mark_notification_read(
        &self,
        notification_id: i64,
        user_id: i64,
    ) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?
        .ok_or_else(|| AppError::not_found("Notification not found"))
    }

    async fn conversation_messages(
        &self,
        ride_id: i64,
        after_id: Option<i64>,
    ) -> AppResult<Vec<ChatMessage>> {
        sqlx::query_as::<_, ChatMessage>(
            "SELECT * FROM chat_messages WHERE ride_id = $1 AND id > $2 ORDER BY id",
        )
        .bind(ride_id)
        .bind(after_id.unwrap_or(0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list messages", e))
    }

    async fn mark_messages_read(&self, ride_id: i64, reader_id: i64) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE chat_messages SET is_read = TRUE, read_at = NOW() \
             WHERE ride_id = $1 AND sender_id <> $2 AND is_read = FALSE",
        )
        .bind(ride_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark messages read", e)
        })?;
        Ok(result.rows_affected())
    }
}
