//! User entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::role::UserRole;

/// A platform user. Account management lives in the surrounding platform;
/// the realtime core only reads display names and roles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Persisted string form of [`UserRole`].
    pub role: String,
}

impl User {
    /// The typed role, if the stored value is recognized.
    pub fn parsed_role(&self) -> Option<UserRole> {
        UserRole::parse(&self.role)
    }

    /// Display name, `"First Last"` falling back to the username.
    pub fn full_name(&self) -> String {
        if self.first_name.is_empty() && self.last_name.is_empty() {
            self.username.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string()
        }
    }
}
