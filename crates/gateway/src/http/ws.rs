//! `/ws` — the event bus (C1) exposed verbatim over WebSocket.
//!
//! Each frame is a `TraceEvent` serialized as JSON, matching
//! `{kind, session_id, timestamp, payload}` on the wire. Clients filter by
//! `kind` themselves, or narrow server-side with `?kind=<wire_name>`.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use pryx_domain::EventKind;

use crate::state::AppState;

const ALL_KINDS: &[EventKind] = &[
    EventKind::ToolCall,
    EventKind::Approval,
    EventKind::Message,
    EventKind::Error,
    EventKind::SubagentStarted,
    EventKind::SubagentCompleted,
    EventKind::SessionStats,
    EventKind::MemoryWarning,
    EventKind::MemorySummarizeRequest,
    EventKind::MemorySummarized,
    EventKind::SessionArchived,
    EventKind::SessionsCleaned,
    EventKind::SessionCreated,
    EventKind::SessionMessage,
];

fn parse_kind(wire: &str) -> Option<EventKind> {
    ALL_KINDS.iter().copied().find(|k| k.wire_name() == wire)
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Pre-shared token, required when `PRYX_API_TOKEN` is set.
    pub token: Option<String>,
    /// Restrict the stream to a single event kind (wire name, e.g.
    /// `subagent.started`). Omit to receive every kind.
    pub kind: Option<String>,
}

/// GET /ws — upgrade to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> impl IntoResponse {
    if let Some(expected_hash) = &state.api_token_hash {
        let provided = query.token.as_deref().unwrap_or("");
        let provided_hash = Sha256::digest(provided.as_bytes());
        if !bool::from(provided_hash.ct_eq(expected_hash.as_slice())) {
            return (
                axum::http::StatusCode::UNAUTHORIZED,
                "invalid or missing token",
            )
                .into_response();
        }
    }

    let kinds: Vec<EventKind> = match query.kind.as_deref() {
        Some(wire) => match parse_kind(wire) {
            Some(k) => vec![k],
            None => {
                return (axum::http::StatusCode::BAD_REQUEST, "unknown event kind")
                    .into_response()
            }
        },
        None => ALL_KINDS.to_vec(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, kinds))
        .into_response()
}

async fn handle_socket(socket: WebSocket, state: AppState, kinds: Vec<EventKind>) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // One bus subscription per requested kind, fanned into a single
    // outbound channel drained by the writer below.
    let (tx, mut rx) = mpsc::channel(256);
    let mut cancels = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let (mut sub, cancel) = state.bus.subscribe(kind);
        cancels.push(cancel);
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(event) = sub.recv().await {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(tx);

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if ws_sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Reader loop: the only inbound traffic we expect is Close/Ping/Pong;
    // any text frame is ignored (this endpoint is read-only from the
    // client's perspective).
    while let Some(Ok(msg)) = ws_stream.next().await {
        match msg {
            Message::Close(_) => break,
            Message::Text(_) | Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    writer.abort();
    for cancel in cancels {
        cancel.cancel();
    }
}
