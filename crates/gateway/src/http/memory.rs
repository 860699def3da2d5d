//! Memory endpoints backed by `pryx-memory` (C4).

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use pryx_domain::Error;
use pryx_memory::{ListOptions, MemoryEntryType, MemorySource, SearchOptions};

use crate::http::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WriteBody {
    pub content: String,
    /// Required for `daily` entries, ignored otherwise.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub sources: Vec<MemorySource>,
}

/// POST /v1/memory/daily
pub async fn write_daily(
    State(state): State<AppState>,
    Json(body): Json<WriteBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let date = body
        .date
        .ok_or_else(|| Error::InvalidInput("date is required for daily entries".into()))?;
    let entry = state.memory.write_daily(&date, &body.content, body.sources)?;
    Ok(Json(serde_json::to_value(entry).unwrap()))
}

/// POST /v1/memory/longterm
pub async fn write_longterm(
    State(state): State<AppState>,
    Json(body): Json<WriteBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let entry = state.memory.write_longterm(&body.content, body.sources)?;
    Ok(Json(serde_json::to_value(entry).unwrap()))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /v1/memory
pub async fn list_entries(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let opts = ListOptions {
        entry_type: q.entry_type.as_deref().and_then(MemoryEntryType::parse),
        date: q.date,
        limit: q.limit,
    };
    let entries = state.memory.list(&opts)?;
    Ok(Json(serde_json::to_value(entries).unwrap()))
}

/// GET /v1/memory/:id
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let entry = state
        .memory
        .get(id)?
        .ok_or_else(|| Error::NotFound(format!("memory entry {id}")))?;
    Ok(Json(serde_json::to_value(entry).unwrap()))
}

/// DELETE /v1/memory/:id
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    state.memory.delete(id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_fts: bool,
}

/// GET /v1/memory/search
pub async fn search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let opts = SearchOptions {
        limit: q.limit,
        include_fts: q.include_fts,
    };
    let hits = state.memory.search(&q.q, &opts)?;
    Ok(Json(serde_json::json!(hits
        .into_iter()
        .map(|h| serde_json::json!({ "entry": h.entry, "score": h.score }))
        .collect::<Vec<_>>())))
}
