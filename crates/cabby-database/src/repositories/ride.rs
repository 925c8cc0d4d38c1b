//! Ride lookups and the single status mutation the realtime service owns.

use async_trait::async_trait;
use sqlx::PgPool;

use cabby_core::error::{AppError, ErrorKind};
use cabby_core::result::AppResult;
use cabby_entity::ride::{Ride, RideStatus};
use cabby_entity::user::UserRole;

/// Read access to rides, plus the status-column update performed by the
/// lifecycle endpoints. Everything else about a ride belongs to the
/// booking subsystem.
#[async_trait]
pub trait RideDirectory: Send + Sync {
    /// Look up a ride by id.
    async fn find_ride(&self, ride_id: i64) -> AppResult<Option<Ride>>;

    /// The user's most recent active ride, if any. Which statuses count as
    /// active depends on the role: a rider is active from REQUESTED, a
    /// driver only once assigned.
    async fn active_ride_for(&self, user_id: i64, role: UserRole) -> AppResult<Option<Ride>>;

    /// Apply a status transition, optionally assigning the driver (the
    /// ACCEPTED transition). Returns the updated row; `NotFound` if the
    /// ride does not exist.
    async fn update_ride_status(
        &self,
        ride_id: i64,
        new_status: RideStatus,
        driver_id: Option<i64>,
    ) -> AppResult<Ride>;
}

/// PostgreSQL ride repository.
#[derive(Debug, Clone)]
pub struct RideRepository {
    pool: PgPool,
}

impl RideRepository {
    /// Create a new ride repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RideDirectory for RideRepository {
    async fn find_ride(&self, ride_id: i64) -> AppResult<Option<Ride>> {
        sqlx::query_as::<_, Ride>(
            "SELECT id, rider_id, driver_id, status, created_at, updated_at \
             FROM rides WHERE id = $1",
        )
        .bind(ride_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find ride", e))
    }

    async fn active_ride_for(&self, user_id: i64, role: UserRole) -> AppResult<Option<Ride>> {
        let query = match role {
            UserRole::Driver => sqlx::query_as::<_, Ride>(
                "SELECT id, rider_id, driver_id, status, created_at, updated_at \
                 FROM rides WHERE driver_id = $1 AND status IN ('ACCEPTED', 'STARTED') \
                 ORDER BY created_at DESC LIMIT 1",
            ),
            _ => sqlx::query_as::<_, Ride>(
                "SELECT id, rider_id, driver_id, status, created_at, updated_at \
                 FROM rides WHERE rider_id = $1 AND status IN ('REQUESTED', 'ACCEPTED', 'STARTED') \
                 ORDER BY created_at DESC LIMIT 1",
            ),
        };

        query
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find active ride", e))
    }

    async fn update_ride_status(
        &self,
        ride_id: i64,
        new_status: RideStatus,
        driver_id: Option<i64>,
    ) -> AppResult<Ride> {
        sqlx::query_as::<_, Ride>(
            "UPDATE rides SET status = $2, driver_id = COALESCE($3, driver_id), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, rider_id, driver_id, status, created_at, updated_at",
        )
        .bind(ride_id)
        .bind(new_status.as_str())
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update ride status", e))?
        .ok_or_else(|| AppError::not_found("Ride not found"))
    }
}
