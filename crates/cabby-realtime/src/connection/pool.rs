//! Shared pool of live connections, indexed by id and by user.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use super::handle::{ConnectionHandle, ConnectionId};

/// All live connections for this process.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    by_user: DashMap<i64, Vec<ConnectionId>>,
}

impl ConnectionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            by_id: DashMap::new(),
            by_user: DashMap::new(),
        }
    }

    /// Inserts a connection.
    pub fn insert(&self, handle: Arc<ConnectionHandle>) {
        if let Some(user_id) = handle.user_id {
            self.by_user.entry(user_id).or_default().push(handle.id);
        }
        self.by_id.insert(handle.id, handle);
    }

    /// Removes a connection, returning its handle if it was present.
    pub fn remove(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(&conn_id)?;
        if let Some(user_id) = handle.user_id {
            if let Some(mut conns) = self.by_user.get_mut(&user_id) {
                conns.retain(|id| *id != conn_id);
                if conns.is_empty() {
                    drop(conns);
                    self.by_user.remove(&user_id);
                }
            }
        }
        Some(handle)
    }

    /// Looks up a connection by id.
    pub fn get(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(&conn_id).map(|entry| entry.value().clone())
    }

    /// Connection ids for a user, oldest first.
    pub fn connections_for_user(&self, user_id: i64) -> Vec<ConnectionId> {
        self.by_user
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Connections idle past the given timeout.
    pub fn idle_connections(&self, timeout: Duration) -> Vec<ConnectionId> {
        self.by_id
            .iter()
            .filter(|entry| entry.value().idle_for() > timeout)
            .map(|entry| *entry.key())
            .collect()
    }
}
