//! Ride status enumeration and its legal-transition graph.
//!
//! The realtime core does not own the ride state machine; it validates
//! status values published through it and selects the human-readable
//! messages shown to riders and drivers.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    /// Rider requested, no driver assigned yet.
    Requested,
    /// A driver accepted the ride.
    Accepted,
    /// The ride is in progress.
    Started,
    /// The ride finished normally. Terminal.
    Completed,
    /// The ride was cancelled by either party. Terminal.
    Cancelled,
}

impl RideStatus {
    /// Return the status as its persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Accepted => "ACCEPTED",
            Self::Started => "STARTED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse a persisted status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "REQUESTED" => Some(Self::Requested),
            "ACCEPTED" => Some(Self::Accepted),
            "STARTED" => Some(Self::Started),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether `next` is a legal transition from this status.
    pub fn can_transition_to(&self, next: RideStatus) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::Accepted)
                | (Self::Requested, Self::Cancelled)
                | (Self::Accepted, Self::Started)
                | (Self::Accepted, Self::Cancelled)
                | (Self::Started, Self::Completed)
        )
    }

    /// Whether this status ends the ride.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Fallback message shown by the polling endpoint when no unread
    /// notification is pending for the ride.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::Requested => "Looking for a driver",
            Self::Accepted => "A driver has accepted your ride",
            Self::Started => "Your ride is in progress",
            Self::Completed => "Your ride has been completed",
            Self::Cancelled => "Your ride has been cancelled",
        }
    }

    /// Short message used in active-ride summaries of the catch-up feed.
    pub fn summary_message(&self) -> &'static str {
        match self {
            Self::Requested => "Waiting for driver",
            Self::Accepted => "Driver is on the way",
            Self::Started => "Ride in progress",
            Self::Completed => "Ride completed",
            Self::Cancelled => "Ride cancelled",
        }
    }

    /// Title used for the persisted notification of a status transition,
    /// e.g. `"Ride Accepted"`.
    pub fn notification_title(&self) -> &'static str {
        match self {
            Self::Requested => "Ride Requested",
            Self::Accepted => "Ride Accepted",
            Self::Started => "Ride Started",
            Self::Completed => "Ride Completed",
            Self::Cancelled => "Ride Cancelled",
        }
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use RideStatus::*;
        assert!(Requested.can_transition_to(Accepted));
        assert!(Requested.can_transition_to(Cancelled));
        assert!(Accepted.can_transition_to(Started));
        assert!(Accepted.can_transition_to(Cancelled));
        assert!(Started.can_transition_to(Completed));
    }

    #[test]
    fn test_illegal_transitions() {
        use RideStatus::*;
        assert!(!Requested.can_transition_to(Started));
        assert!(!Started.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Requested));
        assert!(!Cancelled.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(Accepted));
    }

    #[test]
    fn test_parse_roundtrip() {
        for s in ["REQUESTED", "ACCEPTED", "STARTED", "COMPLETED", "CANCELLED"] {
            assert_eq!(RideStatus::parse(s).map(|v| v.as_str()), Some(s));
        }
        assert_eq!(RideStatus::parse("ARRIVED"), None);
    }

    #[test]
    fn test_terminal() {
        assert!(RideStatus::Completed.is_terminal());
        assert!(RideStatus::Cancelled.is_terminal());
        assert!(!RideStatus::Started.is_terminal());
    }
}
