//! Ride lifecycle endpoints and the ride status polling fallback.
//!
//! The lifecycle endpoints own the participant and transition checks,
//! update the ride row, and then emit through the publisher so both the
//! durable notification and the live push happen. A database failure
//! from the emit aborts the action.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use cabby_core::error::AppError;
use cabby_entity::notification::{NewNotification, NotificationCategory};
use cabby_entity::ride::{Ride, RideRole, RideStatus};
use cabby_entity::user::UserRole;
use cabby_realtime::catchup::{self, RideStatusPoll};

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Response of a lifecycle action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideActionResponse {
    /// Always true on success.
    pub success: bool,
    /// Ride id.
    pub ride_id: i64,
    /// Status after the transition.
    pub status: String,
}

/// GET /api/rides/{id}/status: polling fallback
pub async fn status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ride_id): Path<i64>,
) -> ApiResult<Json<RideStatusPoll>> {
    let ride = load_ride(&state, ride_id).await?;
    let poll = catchup::poll_ride_status(state.store.as_ref(), &ride, user.id).await?;
    Ok(Json(poll))
}

/// POST /api/rides/{id}/accept: driver takes a requested ride
pub async fn accept(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ride_id): Path<i64>,
) -> ApiResult<Json<RideActionResponse>> {
    if user.parsed_role() != Some(UserRole::Driver) {
        return Err(AppError::forbidden("Only drivers can accept rides").into());
    }
    let ride = load_ride(&state, ride_id).await?;
    check_transition(&ride, RideStatus::Accepted, "This ride is no longer available")?;

    let updated = state
        .rides
        .update_ride_status(ride_id, RideStatus::Accepted, Some(user.id))
        .await?;

    state
        .engine
        .publisher()
        .emit_ride_status(
            updated.rider_id,
            ride_id,
            "ACCEPTED",
            format!("Driver {} has accepted your ride", user.full_name()),
            Some(&user),
            None,
        )
        .await?;

    Ok(Json(action_response(updated)))
}

/// POST /api/rides/{id}/start: assigned driver starts the ride
pub async fn start(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ride_id): Path<i64>,
) -> ApiResult<Json<RideActionResponse>> {
    let ride = load_ride(&state, ride_id).await?;
    if ride.role_of(user.id) != Some(RideRole::Driver) {
        return Err(AppError::forbidden("You are not authorized to start this ride").into());
    }
    check_transition(&ride, RideStatus::Started, "This ride cannot be started")?;

    let updated = state
        .rides
        .update_ride_status(ride_id, RideStatus::Started, None)
        .await?;

    state
        .engine
        .publisher()
        .emit_ride_status(
            updated.rider_id,
            ride_id,
            "STARTED",
            "Your ride has started",
            Some(&user),
            Some(format!("/rides/{ride_id}/")),
        )
        .await?;

    Ok(Json(action_response(updated)))
}

/// POST /api/rides/{id}/complete: assigned driver completes the ride
pub async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ride_id): Path<i64>,
) -> ApiResult<Json<RideActionResponse>> {
    let ride = load_ride(&state, ride_id).await?;
    if ride.role_of(user.id) != Some(RideRole::Driver) {
        return Err(AppError::forbidden("You are not authorized to complete this ride").into());
    }
    check_transition(&ride, RideStatus::Completed, "This ride cannot be completed")?;

    let updated = state
        .rides
        .update_ride_status(ride_id, RideStatus::Completed, None)
        .await?;

    state
        .engine
        .publisher()
        .emit_ride_status(
            updated.rider_id,
            ride_id,
            "COMPLETED",
            "Your ride has been completed",
            Some(&user),
            Some(format!("/rides/{ride_id}/")),
        )
        .await?;

    // the driver gets a plain notification rather than a status frame
    state
        .engine
        .publisher()
        .emit_notification(NewNotification::for_ride(
            user.id,
            NotificationCategory::RideCompleted,
            "Ride Completed",
            "You've completed the ride",
            ride_id,
            Some(format!("/rides/{ride_id}/")),
        ))
        .await?;

    Ok(Json(action_response(updated)))
}

/// POST /api/rides/{id}/cancel: either party cancels; the other is told
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ride_id): Path<i64>,
) -> ApiResult<Json<RideActionResponse>> {
    let ride = load_ride(&state, ride_id).await?;
    let role = ride
        .role_of(user.id)
        .ok_or_else(|| AppError::forbidden("You are not authorized to cancel this ride"))?;
    check_transition(&ride, RideStatus::Cancelled, "This ride cannot be cancelled")?;

    let updated = state
        .rides
        .update_ride_status(ride_id, RideStatus::Cancelled, None)
        .await?;

    match role {
        RideRole::Rider => {
            if let Some(driver_id) = updated.driver_id {
                state
                    .engine
                    .publisher()
                    .emit_ride_status(
                        driver_id,
                        ride_id,
                        "CANCELLED",
                        format!("{} has cancelled the ride", user.full_name()),
                        None,
                        Some("/dashboard/".to_string()),
                    )
                    .await?;
            }
        }
        RideRole::Driver => {
            state
                .engine
                .publisher()
                .emit_ride_status(
                    updated.rider_id,
                    ride_id,
                    "CANCELLED",
                    format!("Driver {} has cancelled your ride", user.full_name()),
                    Some(&user),
                    Some("/dashboard/".to_string()),
                )
                .await?;
        }
    }

    Ok(Json(action_response(updated)))
}

async fn load_ride(state: &AppState, ride_id: i64) -> Result<Ride, ApiError> {
    Ok(state
        .rides
        .find_ride(ride_id)
        .await?
        .ok_or_else(|| AppError::not_found("Ride not found"))?)
}

fn check_transition(ride: &Ride, next: RideStatus, message: &str) -> Result<(), ApiError> {
    let current = ride
        .parsed_status()
        .ok_or_else(|| AppError::internal(format!("Ride has unknown status: {}", ride.status)))?;
    if !current.can_transition_to(next) {
        return Err(AppError::validation(message).into());
    }
    Ok(())
}

fn action_response(ride: Ride) -> RideActionResponse {
    RideActionResponse {
        success: true,
        ride_id: ride.id,
        status: ride.status,
    }
}
