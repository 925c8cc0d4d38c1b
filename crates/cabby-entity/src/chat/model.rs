//! Chat message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single message in a ride conversation.
///
/// The BIGSERIAL `id` is the monotonic sequence within a conversation;
/// message listings are always ordered by it ascending. Immutable after
/// creation except `is_read`/`read_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    /// Unique message identifier, strictly increasing in insertion order.
    pub id: i64,
    /// Conversation identifier (the ride id).
    pub ride_id: i64,
    /// The sending user.
    pub sender_id: i64,
    /// Message body.
    pub content: String,
    /// Whether the counterparty has read this message.
    pub is_read: bool,
    /// When the message was read, if it has been.
    pub read_at: Option<DateTime<Utc>>,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
}

/// Insertion payload for a chat message.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    /// Conversation (ride) id.
    pub ride_id: i64,
    /// Sending user.
    pub sender_id: i64,
    /// Message body. Must be non-empty; validated before append.
    pub content: String,
}
