//! Notification category enumeration.

use serde::{Deserialize, Serialize};

use crate::ride::status::RideStatus;

/// Category of a notification, matching the persisted `category` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    /// A new ride was requested (sent to drivers).
    RideRequest,
    /// A driver accepted the ride.
    RideAccepted,
    /// The ride started.
    RideStarted,
    /// The ride completed.
    RideCompleted,
    /// The ride was cancelled.
    RideCancelled,
    /// Payment-related notifications.
    Payment,
    /// System-level notifications.
    System,
}

impl NotificationCategory {
    /// Return the category as its persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RideRequest => "RIDE_REQUEST",
            Self::RideAccepted => "RIDE_ACCEPTED",
            Self::RideStarted => "RIDE_STARTED",
            Self::RideCompleted => "RIDE_COMPLETED",
            Self::RideCancelled => "RIDE_CANCELLED",
            Self::Payment => "PAYMENT",
            Self::System => "SYSTEM",
        }
    }

    /// Parse a persisted category string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RIDE_REQUEST" => Some(Self::RideRequest),
            "RIDE_ACCEPTED" => Some(Self::RideAccepted),
            "RIDE_STARTED" => Some(Self::RideStarted),
            "RIDE_COMPLETED" => Some(Self::RideCompleted),
            "RIDE_CANCELLED" => Some(Self::RideCancelled),
            "PAYMENT" => Some(Self::Payment),
            "SYSTEM" => Some(Self::System),
            _ => None,
        }
    }

    /// Category carried by a ride status transition notification.
    pub fn for_ride_status(status: RideStatus) -> Self {
        match status {
            RideStatus::Requested => Self::RideRequest,
            RideStatus::Accepted => Self::RideAccepted,
            RideStatus::Started => Self::RideStarted,
            RideStatus::Completed => Self::RideCompleted,
            RideStatus::Cancelled => Self::RideCancelled,
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
