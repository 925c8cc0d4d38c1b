//! Ride entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::RideStatus;

/// Role of a user within a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideRole {
    /// The requesting rider.
    Rider,
    /// The assigned driver.
    Driver,
}

/// A ride, owned by the booking subsystem. The realtime core reads it to
/// authorize conversation access and select status messages; the only
/// mutation it performs is the status column during lifecycle transitions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ride {
    /// Unique ride identifier. Doubles as the chat conversation id.
    pub id: i64,
    /// The requesting rider.
    pub rider_id: i64,
    /// The assigned driver, once one accepted.
    pub driver_id: Option<i64>,
    /// Persisted string form of [`RideStatus`].
    pub status: String,
    /// When the ride was requested.
    pub created_at: DateTime<Utc>,
    /// When the ride row last changed.
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    /// The typed status, if the stored value is recognized.
    pub fn parsed_status(&self) -> Option<RideStatus> {
        RideStatus::parse(&self.status)
    }

    /// The role `user_id` plays in this ride, if any.
    pub fn role_of(&self, user_id: i64) -> Option<RideRole> {
        if self.rider_id == user_id {
            Some(RideRole::Rider)
        } else if self.driver_id == Some(user_id) {
            Some(RideRole::Driver)
        } else {
            None
        }
    }

    /// Whether `user_id` is the rider or the driver.
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.role_of(user_id).is_some()
    }

    /// The other party of the conversation, relative to `user_id`.
    pub fn counterparty(&self, user_id: i64) -> Option<i64> {
        match self.role_of(user_id)? {
            RideRole::Rider => self.driver_id,
            RideRole::Driver => Some(self.rider_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ride() -> Ride {
        Ride {
            id: 42,
            rider_id: 1,
            driver_id: Some(7),
            status: "ACCEPTED".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_roles() {
        let r = ride();
        assert_eq!(r.role_of(1), Some(RideRole::Rider));
        assert_eq!(r.role_of(7), Some(RideRole::Driver));
        assert_eq!(r.role_of(9), None);
        assert!(r.is_participant(1));
        assert!(!r.is_participant(9));
    }

    #[test]
    fn test_counterparty() {
        let r = ride();
        assert_eq!(r.counterparty(1), Some(7));
        assert_eq!(r.counterparty(7), Some(1));
        assert_eq!(r.counterparty(9), None);
    }

    #[test]
    fn test_parsed_status() {
        assert_eq!(ride().parsed_status(), Some(RideStatus::Accepted));
    }
}
