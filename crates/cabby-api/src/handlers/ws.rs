//! WebSocket upgrade handlers for both realtime channels.
//!
//! Both channels accept anonymous connections, so token validation here
//! is best effort: a missing or invalid token downgrades the session
//! instead of refusing the upgrade. The socket tasks only shuttle text
//! frames; all protocol logic lives in the realtime engine.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use cabby_realtime::ConnectionHandle;

use crate::state::AppState;

/// Query parameters for WebSocket authentication.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Optional JWT access token.
    pub token: Option<String>,
}

/// GET /ws/notifications?token={jwt}: personal notification channel
pub async fn notifications_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Response {
    let identity = state.jwt_decoder.identity(query.token.as_deref());
    ws.on_upgrade(move |socket| async move {
        let (handle, outbound_rx) = state.engine.open_notification_session(identity).await;
        run_session(state, socket, handle, outbound_rx).await;
    })
}

/// GET /ws/chat/{ride_id}?token={jwt}: per-ride chat channel
pub async fn chat_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Path(ride_id): Path<i64>,
    Query(query): Query<WsQuery>,
) -> Response {
    let identity = state.jwt_decoder.identity(query.token.as_deref());
    ws.on_upgrade(move |socket| async move {
        let (handle, outbound_rx) = state.engine.open_chat_session(ride_id, identity);
        run_session(state, socket, handle, outbound_rx).await;
    })
}

/// Shuttles frames between the socket and the session's queues until
/// either side closes.
async fn run_session(
    state: AppState,
    socket: WebSocket,
    handle: Arc<ConnectionHandle>,
    mut outbound_rx: mpsc::Receiver<String>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let conn_id = handle.id;

    info!(
        conn_id = %conn_id,
        user_id = ?handle.user_id,
        kind = ?handle.kind,
        "WebSocket connection established"
    );

    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                state.engine.handle_inbound(&handle, &text).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    outbound_task.abort();
    state.engine.close_session(conn_id);

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
