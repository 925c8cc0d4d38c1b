//! Conversation catch-up endpoint (polling fallback for chat).

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use cabby_core::error::AppError;
use cabby_entity::chat::ChatMessage;
use cabby_realtime::catchup;

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Query parameters for the conversation listing.
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Return only messages with id strictly greater than this.
    pub after: Option<i64>,
}

/// Conversation listing response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    /// Messages in chronological order.
    pub messages: Vec<ChatMessage>,
}

/// GET /api/rides/{id}/messages?after={id}
pub async fn messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ride_id): Path<i64>,
    Query(query): Query<MessagesQuery>,
) -> ApiResult<Json<MessagesResponse>> {
    let ride = state
        .rides
        .find_ride(ride_id)
        .await?
        .ok_or_else(|| AppError::not_found("Ride not found"))?;

    let messages =
        catchup::conversation_catchup(state.store.as_ref(), &ride, user.id, query.after).await?;
    Ok(Json(MessagesResponse { messages }))
}
