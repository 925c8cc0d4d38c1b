//! Per-connection handle with its outbound queue.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Ephemeral connection identifier. Never persisted.
pub type ConnectionId = Uuid;

/// Which channel a connection is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Personal notification stream.
    Notifications,
    /// Per-ride chat conversation.
    Chat {
        /// Conversation (ride) id.
        ride_id: i64,
    },
}

/// Result of a non-blocking push to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Frame queued for delivery.
    Sent,
    /// Outbound queue full; the frame was dropped for this subscriber.
    Dropped,
    /// Receiver gone; the connection is dead and must be swept.
    Closed,
}

/// Live connection state shared between the session tasks and the pool.
///
/// The outbound queue is bounded; fan-out never blocks on a slow
/// subscriber.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Connection id.
    pub id: ConnectionId,
    /// Authenticated user, if any. Anonymous sessions are accepted but
    /// receive no topic subscriptions.
    pub user_id: Option<i64>,
    /// Session kind.
    pub kind: SessionKind,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<String>,
    last_seen: RwLock<Instant>,
}

impl ConnectionHandle {
    /// Creates a handle and the receiver end of its outbound queue.
    pub fn new(
        user_id: Option<i64>,
        kind: SessionKind,
        buffer_size: usize,
    ) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        let handle = Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            connected_at: Utc::now(),
            sender: tx,
            last_seen: RwLock::new(Instant::now()),
        };
        (handle, rx)
    }

    /// Whether the session carries an authenticated identity.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Queues a serialized frame without blocking.
    pub fn try_send(&self, payload: String) -> SendOutcome {
        match self.sender.try_send(payload) {
            Ok(()) => SendOutcome::Sent,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Outbound queue full, dropping frame");
                SendOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => SendOutcome::Closed,
        }
    }

    /// Records inbound activity for the idle reaper.
    pub fn touch(&self) {
        if let Ok(mut at) = self.last_seen.write() {
            *at = Instant::now();
        }
    }

    /// Time since the last inbound frame.
    pub fn idle_for(&self) -> Duration {
        self.last_seen
            .read()
            .map(|at| at.elapsed())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_send_reports_full_and_closed() {
        let (handle, mut rx) = ConnectionHandle::new(Some(1), SessionKind::Notifications, 1);
        assert_eq!(handle.try_send("a".to_string()), SendOutcome::Sent);
        assert_eq!(handle.try_send("b".to_string()), SendOutcome::Dropped);

        assert_eq!(rx.try_recv().ok(), Some("a".to_string()));
        rx.close();
        drop(rx);
        assert_eq!(handle.try_send("c".to_string()), SendOutcome::Closed);
    }

    #[test]
    fn test_touch_resets_idle_clock() {
        let (handle, _rx) =
            ConnectionHandle::new(None, SessionKind::Chat { ride_id: 42 }, 4);
        assert!(!handle.is_authenticated());
        handle.touch();
        assert!(handle.idle_for() < Duration::from_secs(1));
    }
}
