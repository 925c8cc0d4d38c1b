//! Session state machine for both WebSocket channels.
//!
//! The engine owns the handshake and inbound command handling; the
//! transport layer only shuttles text frames between the socket and the
//! engine. Both channels accept anonymous connections: anonymous
//! notification sessions get a warning and no subscriptions, anonymous
//! chat sessions may claim a sender id per message (verified against the
//! user directory, no standing trust).

use std::sync::Arc;

use tokio::sync::mpsc;

use cabby_core::error::ErrorKind;
use cabby_database::repositories::{RideDirectory, UserDirectory};
use cabby_database::EventStore;

use crate::channel::types::TopicKey;
use crate::connection::handle::{ConnectionHandle, ConnectionId, SessionKind};
use crate::connection::manager::ConnectionManager;
use crate::message::types::{ChatFrame, ChatInbound, InboundFrame, NotificationSummary, OutboundFrame};
use crate::publisher::Publisher;
use crate::UNREAD_BURST_LIMIT;

/// Ties the connection manager, publisher and store together into the
/// per-session protocol.
#[derive(Clone)]
pub struct RealtimeEngine {
    manager: Arc<ConnectionManager>,
    publisher: Publisher,
    store: Arc<dyn EventStore>,
    rides: Arc<dyn RideDirectory>,
    users: Arc<dyn UserDirectory>,
}

impl RealtimeEngine {
    /// Creates the engine.
    pub fn new(
        manager: Arc<ConnectionManager>,
        publisher: Publisher,
        store: Arc<dyn EventStore>,
        rides: Arc<dyn RideDirectory>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            manager,
            publisher,
            store,
            rides,
            users,
        }
    }

    /// The connection manager.
    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// The publisher, for business-logic handlers.
    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Opens a notification session. Always accepted.
    ///
    /// Authenticated sessions are subscribed to their personal topic and
    /// receive a `connection_status` followed by the one-shot unread
    /// burst (when non-empty). Anonymous sessions only get a warning
    /// status. The burst is best effort: a store failure downgrades the
    /// session, it never refuses it.
    pub async fn open_notification_session(
        &self,
        user_id: Option<i64>,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (handle, rx) = self.manager.register(user_id, SessionKind::Notifications);

        let Some(user_id) = user_id else {
            handle.try_send(
                OutboundFrame::ConnectionStatus {
                    status: "warning".to_string(),
                    message: "Connected without authentication. Some notifications may not be received.".to_string(),
                }
                .to_json(),
            );
            return (handle, rx);
        };

        self.manager.subscribe(&TopicKey::User(user_id), handle.id);
        handle.try_send(
            OutboundFrame::ConnectionStatus {
                status: "connected".to_string(),
                message: "Successfully connected to notification channel".to_string(),
            }
            .to_json(),
        );

        match self
            .store
            .notifications_for_user(user_id, None, UNREAD_BURST_LIMIT)
            .await
        {
            Ok(unread) if !unread.is_empty() => {
                handle.try_send(
                    OutboundFrame::UnreadNotifications {
                        notifications: unread.iter().map(NotificationSummary::from).collect(),
                    }
                    .to_json(),
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Skipping unread burst");
            }
        }
        (handle, rx)
    }

    /// Opens a chat session for one ride conversation. Always accepted;
    /// only authenticated sessions join the conversation topic.
    pub fn open_chat_session(
        &self,
        ride_id: i64,
        user_id: Option<i64>,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (handle, rx) = self
            .manager
            .register(user_id, SessionKind::Chat { ride_id });

        if user_id.is_some() {
            self.manager
                .subscribe(&TopicKey::Conversation(ride_id), handle.id);
            handle.try_send(
                ChatFrame::Status {
                    status: "Connected to chat room".to_string(),
                    authenticated: true,
                }
                .to_json(),
            );
        } else {
            handle.try_send(
                ChatFrame::Status {
                    status: "Connected to chat room (anonymous)".to_string(),
                    authenticated: false,
                }
                .to_json(),
            );
        }
        (handle, rx)
    }

    /// Handles one inbound text frame. Protocol errors are reported on
    /// the session's own queue; the session always stays open.
    pub async fn handle_inbound(&self, handle: &ConnectionHandle, raw: &str) {
        handle.touch();
        match handle.kind {
            SessionKind::Notifications => self.handle_notification_frame(handle, raw).await,
            SessionKind::Chat { ride_id } => self.handle_chat_frame(handle, ride_id, raw).await,
        }
    }

    /// Tears down a session. Idempotent.
    pub fn close_session(&self, conn_id: ConnectionId) {
        self.manager.unregister(conn_id);
    }

    async fn handle_notification_frame(&self, handle: &ConnectionHandle, raw: &str) {
        let frame: InboundFrame = match serde_json::from_str(raw) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(conn_id = %handle.id, error = %e, "Malformed inbound frame");
                handle.try_send(
                    OutboundFrame::Error {
                        message: "Invalid message format".to_string(),
                    }
                    .to_json(),
                );
                return;
            }
        };

        match frame {
            InboundFrame::Heartbeat => {
                handle.try_send(
                    OutboundFrame::HeartbeatResponse {
                        status: "alive".to_string(),
                    }
                    .to_json(),
                );
            }
            InboundFrame::Ping { timestamp } => {
                handle.try_send(OutboundFrame::Pong { timestamp }.to_json());
            }
            InboundFrame::MarkRead { notification_id } => {
                self.mark_read(handle, notification_id).await;
            }
        }
    }

    async fn mark_read(&self, handle: &ConnectionHandle, notification_id: i64) {
        let Some(user_id) = handle.user_id else {
            handle.try_send(
                OutboundFrame::Error {
                    message: "Authentication required".to_string(),
                }
                .to_json(),
            );
            return;
        };

        match self
            .store
            .mark_notification_read(notification_id, user_id)
            .await
        {
            Ok(_) => {
                handle.try_send(
                    OutboundFrame::NotificationMarkedRead { notification_id }.to_json(),
                );
            }
            Err(e) if e.kind == ErrorKind::NotFound => {
                handle.try_send(
                    OutboundFrame::Error {
                        message: "Notification not found".to_string(),
                    }
                    .to_json(),
                );
            }
            Err(e) => {
                tracing::error!(notification_id, user_id, error = %e, "Mark read failed");
                handle.try_send(
                    OutboundFrame::Error {
                        message: "Failed to mark notification read".to_string(),
                    }
                    .to_json(),
                );
            }
        }
    }

    async fn handle_chat_frame(&self, handle: &ConnectionHandle, ride_id: i64, raw: &str) {
        let frame: ChatInbound = match serde_json::from_str(raw) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(conn_id = %handle.id, error = %e, "Malformed chat frame");
                handle.try_send(
                    ChatFrame::Error {
                        error: "Invalid message format".to_string(),
                    }
                    .to_json(),
                );
                return;
            }
        };

        let ride = match self.rides.find_ride(ride_id).await {
            Ok(Some(ride)) => ride,
            Ok(None) => {
                handle.try_send(
                    ChatFrame::Error {
                        error: "Ride not found".to_string(),
                    }
                    .to_json(),
                );
                return;
            }
            Err(e) => {
                tracing::error!(ride_id, error = %e, "Ride lookup failed");
                handle.try_send(
                    ChatFrame::Error {
                        error: "Failed to send message".to_string(),
                    }
                    .to_json(),
                );
                return;
            }
        };

        let sender_id = match handle.user_id {
            Some(user_id) => user_id,
            None => match self.claim_sender(handle, frame.sender_id).await {
                Some(user_id) => user_id,
                None => return,
            },
        };

        match self
            .publisher
            .emit_chat_message(ride.id, sender_id, &frame.message)
            .await
        {
            Ok(_) => {}
            Err(e) if e.kind == ErrorKind::Validation => {
                handle.try_send(ChatFrame::Error { error: e.message }.to_json());
            }
            Err(e) => {
                tracing::error!(ride_id, sender_id, error = %e, "Chat emit failed");
                handle.try_send(
                    ChatFrame::Error {
                        error: "Failed to send message".to_string(),
                    }
                    .to_json(),
                );
            }
        }
    }

    // One-shot sender claim for anonymous chat sessions. The claimed id
    // must name an existing user; it grants nothing beyond this message.
    async fn claim_sender(
        &self,
        handle: &ConnectionHandle,
        claimed: Option<i64>,
    ) -> Option<i64> {
        let Some(claimed) = claimed else {
            handle.try_send(
                ChatFrame::Error {
                    error: "Authentication required".to_string(),
                }
                .to_json(),
            );
            return None;
        };
        match self.users.find_user(claimed).await {
            Ok(Some(user)) => Some(user.id),
            Ok(None) => {
                handle.try_send(
                    ChatFrame::Error {
                        error: "User not found".to_string(),
                    }
                    .to_json(),
                );
                None
            }
            Err(e) => {
                tracing::error!(claimed, error = %e, "Sender lookup failed");
                handle.try_send(
                    ChatFrame::Error {
                        error: "Failed to send message".to_string(),
                    }
                    .to_json(),
                );
                None
            }
        }
    }
}
