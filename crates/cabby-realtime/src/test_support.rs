//! In-memory test doubles for the event store and directories.
//!
//! Tests in this crate run without a database or socket; the doubles
//! honor the same ordering and scoping contracts as the Postgres
//! implementations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use cabby_core::error::AppError;
use cabby_core::result::AppResult;
use cabby_database::repositories::{RideDirectory, UserDirectory};
use cabby_database::EventStore;
use cabby_entity::chat::{ChatMessage, NewChatMessage};
use cabby_entity::notification::{NewNotification, Notification};
use cabby_entity::ride::{Ride, RideStatus};
use cabby_entity::user::{User, UserRole};

#[derive(Default)]
pub(crate) struct MemoryEventStore {
    notifications: Mutex<Vec<Notification>>,
    messages: Mutex<Vec<ChatMessage>>,
    next_id: AtomicI64,
    fail_appends: AtomicBool,
}

impl MemoryEventStore {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    /// Make every subsequent append fail with a database error.
    pub(crate) fn fail_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }

    pub(crate) fn notification_count(&self) -> usize {
        self.notifications.lock().expect("lock").len()
    }

    pub(crate) fn message_count(&self) -> usize {
        self.messages.lock().expect("lock").len()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append_notification(&self, new: NewNotification) -> AppResult<Notification> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AppError::database("Simulated append failure"));
        }
        let id = self.allocate_id();
        let notification = Notification {
            id,
            user_id: new.user_id,
            category: new.category.as_str().to_string(),
            title: new.title,
            message: new.message,
            is_read: false,
            related_to_type: new.related_to_type,
            related_to_id: new.related_to_id,
            action_url: new.action_url,
            // spread creation times so newest-first ordering is observable
            created_at: Utc::now() + Duration::milliseconds(id),
        };
        self.notifications
            .lock()
            .expect("lock")
            .push(notification.clone());
        Ok(notification)
    }

    async fn append_message(&self, new: NewChatMessage) -> AppResult<ChatMessage> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AppError::database("Simulated append failure"));
        }
        let id = self.allocate_id();
        let message = ChatMessage {
            id,
            ride_id: new.ride_id,
            sender_id: new.sender_id,
            content: new.content,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        self.messages.lock().expect("lock").push(message.clone());
        Ok(message)
    }

    async fn notifications_for_user(
        &self,
        user_id: i64,
        since: Option<chrono::DateTime<Utc>>,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .notifications
            .lock()
            .expect("lock")
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| match since {
                Some(since) => n.created_at > since,
                None => !n.is_read,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn unread_for_ride(
        &self,
        user_id: i64,
        ride_id: i64,
    ) -> AppResult<Option<Notification>> {
        let mut rows: Vec<Notification> = self
            .notifications
            .lock()
            .expect("lock")
            .iter()
            .filter(|n| {
                n.user_id == user_id
                    && !n.is_read
                    && n.related_to_type.as_deref() == Some("Ride")
                    && n.related_to_id == Some(ride_id)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows.into_iter().next())
    }

    async fn mark_notification_read(
        &self,
        notification_id: i64,
        user_id: i64,
    ) -> AppResult<Notification> {
        let mut rows = self.notifications.lock().expect("lock");
        let row = rows
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
            .ok_or_else(|| AppError::not_found("Notification not found"))?;
        row.is_read = true;
        Ok(row.clone())
    }

    async fn conversation_messages(
        &self,
        ride_id: i64,
        after_id: Option<i64>,
    ) -> AppResult<Vec<ChatMessage>> {
        let mut rows: Vec<ChatMessage> = self
            .messages
            .lock()
            .expect("lock")
            .iter()
            .filter(|m| m.ride_id == ride_id && m.id > after_id.unwrap_or(0))
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.id);
        Ok(rows)
    }

    async fn mark_messages_read(&self, ride_id: i64, reader_id: i64) -> AppResult<u64> {
        let mut rows = self.messages.lock().expect("lock");
        let mut updated = 0;
        for m in rows
            .iter_mut()
            .filter(|m| m.ride_id == ride_id && m.sender_id != reader_id && !m.is_read)
        {
            m.is_read = true;
            m.read_at = Some(Utc::now());
            updated += 1;
        }
        Ok(updated)
    }
}

#[derive(Default)]
pub(crate) struct StubRideDirectory {
    rides: Mutex<HashMap<i64, Ride>>,
}

impl StubRideDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, ride: Ride) {
        self.rides.lock().expect("lock").insert(ride.id, ride);
    }
}

#[async_trait]
impl RideDirectory for StubRideDirectory {
    async fn find_ride(&self, ride_id: i64) -> AppResult<Option<Ride>> {
        Ok(self.rides.lock().expect("lock").get(&ride_id).cloned())
    }

    async fn active_ride_for(&self, user_id: i64, role: UserRole) -> AppResult<Option<Ride>> {
        let active: &[&str] = match role {
            UserRole::Driver => &["ACCEPTED", "STARTED"],
            _ => &["REQUESTED", "ACCEPTED", "STARTED"],
        };
        let rides = self.rides.lock().expect("lock");
        let mut matches: Vec<&Ride> = rides
            .values()
            .filter(|r| match role {
                UserRole::Driver => r.driver_id == Some(user_id),
                _ => r.rider_id == user_id,
            })
            .filter(|r| active.contains(&r.status.as_str()))
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches.first().map(|r| (*r).clone()))
    }

    async fn update_ride_status(
        &self,
        ride_id: i64,
        new_status: RideStatus,
        driver_id: Option<i64>,
    ) -> AppResult<Ride> {
        let mut rides = self.rides.lock().expect("lock");
        let ride = rides
            .get_mut(&ride_id)
            .ok_or_else(|| AppError::not_found("Ride not found"))?;
        ride.status = new_status.as_str().to_string();
        if driver_id.is_some() {
            ride.driver_id = driver_id;
        }
        ride.updated_at = Utc::now();
        Ok(ride.clone())
    }
}

#[derive(Default)]
pub(crate) struct StubUserDirectory {
    users: Mutex<HashMap<i64, User>>,
}

impl StubUserDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, user: User) {
        self.users.lock().expect("lock").insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for StubUserDirectory {
    async fn find_user(&self, user_id: i64) -> AppResult<Option<User>> {
        Ok(self.users.lock().expect("lock").get(&user_id).cloned())
    }
}

pub(crate) fn sample_ride(id: i64, rider_id: i64, driver_id: Option<i64>, status: &str) -> Ride {
    Ride {
        id,
        rider_id,
        driver_id,
        status: status.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn sample_user(id: i64, username: &str, first: &str, role: UserRole) -> User {
    User {
        id,
        username: username.to_string(),
        first_name: first.to_string(),
        last_name: String::new(),
        role: role.as_str().to_string(),
    }
}
