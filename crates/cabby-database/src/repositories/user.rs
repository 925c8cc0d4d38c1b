//! User lookups (display names and roles).

use async_trait::async_trait;
use sqlx::PgPool;

use cabby_core::error::{AppError, ErrorKind};
use cabby_core::result::AppResult;
use cabby_entity::user::User;

/// Read access to user accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user by id.
    async fn find_user(&self, user_id: i64) -> AppResult<Option<User>>;
}

/// PostgreSQL user repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_user(&self, user_id: i64) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, first_name, last_name, role FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }
}
