//! Skill listing/reading endpoints backed by `pryx-skills` (C5).

use axum::extract::{Path, State};
use axum::response::Json;

use crate::http::error::ApiResult;
use crate::state::AppState;

/// GET /v1/skills
pub async fn list_skills(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!(state.skills.list()))
}

/// GET /v1/skills/:id/doc
pub async fn read_skill_doc(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<String> {
    Ok(state.skills.read_doc(&id)?)
}
