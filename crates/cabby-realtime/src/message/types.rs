//! Inbound and outbound frame type definitions.
//!
//! The notification channel uses JSON objects tagged by a `type` field.
//! The chat channel predates that convention and sends untagged objects;
//! its shapes are kept as-is for client compatibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cabby_entity::notification::Notification;

/// Frames sent by the client on the notification channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Keepalive; the server echoes a `heartbeat_response`.
    Heartbeat,
    /// Ping with a client-supplied timestamp, echoed back verbatim in the
    /// `pong`. Used for clock-skew diagnostics only.
    Ping {
        /// Client timestamp, opaque to the server.
        #[serde(default)]
        timestamp: Option<serde_json::Value>,
    },
    /// Mark one of the caller's own notifications as read.
    MarkRead {
        /// Notification id.
        notification_id: i64,
    },
}

/// Frames sent by the server on the notification channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Handshake outcome.
    ConnectionStatus {
        /// `"connected"` or `"warning"`.
        status: String,
        /// Human-readable detail.
        message: String,
    },
    /// One-shot unread digest delivered on connect.
    UnreadNotifications {
        /// Most recent unread notifications, newest first.
        notifications: Vec<NotificationSummary>,
    },
    /// Live push of one notification.
    NotificationMessage {
        /// Persisted notification id; re-fetchable from history.
        notification_id: i64,
        /// Title.
        title: String,
        /// Body text.
        message: String,
        /// Creation time.
        created_at: DateTime<Utc>,
        /// Related entity tag, e.g. `"Ride_42"`.
        #[serde(skip_serializing_if = "Option::is_none")]
        related_to: Option<String>,
        /// Optional action URL.
        #[serde(skip_serializing_if = "Option::is_none")]
        action_url: Option<String>,
    },
    /// Live push of a ride status transition.
    RideStatusUpdate {
        /// Ride id.
        ride_id: i64,
        /// New status string.
        status: String,
        /// Assigned driver id, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        driver_id: Option<i64>,
        /// Assigned driver display name, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        driver_name: Option<String>,
        /// Human-readable update message.
        message: String,
        /// Redirect target for terminal statuses.
        #[serde(skip_serializing_if = "Option::is_none")]
        redirect_url: Option<String>,
    },
    /// Heartbeat echo.
    HeartbeatResponse {
        /// Always `"alive"`.
        status: String,
    },
    /// Ping echo with the client's own timestamp.
    Pong {
        /// Echoed timestamp.
        timestamp: Option<serde_json::Value>,
    },
    /// Acknowledgement of a `mark_read` command.
    NotificationMarkedRead {
        /// Notification id.
        notification_id: i64,
    },
    /// Recoverable error; the connection stays open.
    Error {
        /// Human-readable message.
        message: String,
    },
}

impl OutboundFrame {
    /// Push frame for a freshly persisted notification.
    pub fn notification_message(n: &Notification) -> Self {
        Self::NotificationMessage {
            notification_id: n.id,
            title: n.title.clone(),
            message: n.message.clone(),
            created_at: n.created_at,
            related_to: n.related_to(),
            action_url: n.action_url.clone(),
        }
    }

    /// Serialize to the wire string. Frame types are infallible to
    /// serialize; should that ever stop holding, the client receives a
    /// well-formed `error` frame instead of garbage.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize outbound frame");
            SERIALIZATION_ERROR_FRAME.to_string()
        })
    }
}

/// Pre-rendered fallback for a frame that failed to serialize, so the
/// failure path cannot itself fail.
const SERIALIZATION_ERROR_FRAME: &str = r#"{"type":"error","message":"Internal server error"}"#;

/// Notification digest entry in an `unread_notifications` burst.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSummary {
    /// Notification id.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Read flag (always false in the burst).
    pub is_read: bool,
}

impl From<&Notification> for NotificationSummary {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            title: n.title.clone(),
            message: n.message.clone(),
            created_at: n.created_at,
            is_read: n.is_read,
        }
    }
}

/// Inbound chat frame: a message to the session's ride conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInbound {
    /// Message body.
    #[serde(default)]
    pub message: String,
    /// Conversation (ride) id as sent by the client; informational, the
    /// session's own ride id is authoritative.
    #[serde(default)]
    pub ride_id: Option<i64>,
    /// Intended receiver; informational.
    #[serde(default)]
    pub receiver_id: Option<i64>,
    /// Claimed sender id, honored for this single message only when the
    /// session itself is anonymous (legacy lenient policy).
    #[serde(default)]
    pub sender_id: Option<i64>,
}

/// Outbound chat frames (untagged, legacy shapes).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatFrame {
    /// Delivered message.
    Message {
        /// Message body.
        message: String,
        /// Sending user.
        sender_id: i64,
        /// Persisted message id.
        message_id: i64,
        /// Creation time.
        created_at: DateTime<Utc>,
    },
    /// Handshake outcome.
    Status {
        /// Human-readable status line.
        status: String,
        /// Whether the session is authenticated.
        authenticated: bool,
    },
    /// Recoverable error; the connection stays open.
    Error {
        /// Human-readable message.
        error: String,
    },
}

impl ChatFrame {
    /// Serialize to the wire string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize chat frame");
            CHAT_SERIALIZATION_ERROR_FRAME.to_string()
        })
    }
}

/// Chat-channel counterpart of [`SERIALIZATION_ERROR_FRAME`].
const CHAT_SERIALIZATION_ERROR_FRAME: &str = r#"{"error":"Internal server error"}"#;
