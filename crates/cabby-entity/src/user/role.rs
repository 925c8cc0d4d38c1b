//! User role enumeration.

use serde::{Deserialize, Serialize};

/// Platform role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Books rides.
    Rider,
    /// Accepts and drives rides.
    Driver,
    /// Platform administrator.
    Admin,
}

impl UserRole {
    /// Return the role as its persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rider => "RIDER",
            Self::Driver => "DRIVER",
            Self::Admin => "ADMIN",
        }
    }

    /// Parse a persisted role string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RIDER" => Some(Self::Rider),
            "DRIVER" => Some(Self::Driver),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
