//! Session and message endpoints backed by the Store (C2).

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use pryx_domain::session::MessageRole;
use pryx_domain::Error;

use crate::http::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionBody {
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /v1/sessions
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let title = body.title.unwrap_or_else(|| "untitled".to_string());
    let session = state.store.create_session(&title)?;
    Ok(Json(serde_json::to_value(session).unwrap()))
}

/// GET /v1/sessions
pub async fn list_sessions(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let sessions = state.store.list_sessions()?;
    Ok(Json(serde_json::to_value(sessions).unwrap()))
}

/// GET /v1/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let session = state
        .store
        .get_session(id)?
        .ok_or_else(|| Error::NotFound(format!("session {id}")))?;
    Ok(Json(serde_json::to_value(session).unwrap()))
}

/// POST /v1/sessions/:id/archive
pub async fn archive_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    state.store.archive_session(id)?;
    Ok(Json(serde_json::json!({ "archived": true })))
}

#[derive(Debug, Deserialize)]
pub struct AddMessageBody {
    pub role: String,
    pub content: String,
}

/// POST /v1/sessions/:id/messages
pub async fn add_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AddMessageBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let role = MessageRole::parse(&body.role)
        .ok_or_else(|| Error::InvalidInput(format!("unknown message role '{}'", body.role)))?;
    let message = state.store.add_message(id, role, &body.content)?;
    Ok(Json(serde_json::to_value(message).unwrap()))
}

/// GET /v1/sessions/:id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let messages = state.store.get_messages(id)?;
    Ok(Json(serde_json::to_value(messages).unwrap()))
}
