//! Notification catch-up feed (polling fallback).

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use cabby_realtime::catchup::{self, NotificationFeed};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Query parameters for the feed.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// ISO 8601 watermark; strictly-newer notifications are returned.
    /// Absent or unparseable yields the unread digest.
    pub since: Option<String>,
}

/// GET /api/notifications?since={iso8601}
pub async fn feed(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<FeedQuery>,
) -> ApiResult<Json<NotificationFeed>> {
    let since = query.since.as_deref().and_then(parse_watermark);
    let feed =
        catchup::notification_feed(state.store.as_ref(), state.rides.as_ref(), &user, since)
            .await?;
    Ok(Json(feed))
}

// An invalid watermark is ignored rather than rejected; the client falls
// back to its unread digest.
fn parse_watermark(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
