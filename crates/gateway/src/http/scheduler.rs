//! Sub-agent lifecycle endpoints backed by `pryx-scheduler` (C6).

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use pryx_domain::Error;
use pryx_scheduler::AgentStatus;

use crate::http::error::ApiResult;
use crate::state::AppState;

fn status_str(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Pending => "pending",
        AgentStatus::Running => "running",
        AgentStatus::Completed => "completed",
        AgentStatus::Failed => "failed",
        AgentStatus::Cancelled => "cancelled",
    }
}

#[derive(Debug, Deserialize)]
pub struct SpawnBody {
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub session_id: Uuid,
    pub task: String,
    #[serde(default)]
    pub system_context: String,
    pub provider_id: String,
}

/// POST /v1/agents
pub async fn spawn(
    State(state): State<AppState>,
    Json(body): Json<SpawnBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let agent = state.scheduler.spawn(
        body.parent_id,
        body.session_id,
        &body.task,
        &body.system_context,
        &body.provider_id,
    )?;
    Ok(Json(serde_json::json!({
        "id": agent.id,
        "status": status_str(agent.status()),
    })))
}

/// GET /v1/agents/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let agent = state
        .scheduler
        .get(id)
        .ok_or_else(|| Error::NotFound(format!("sub-agent {id}")))?;
    Ok(Json(serde_json::json!({
        "id": agent.id,
        "status": status_str(agent.status()),
        "token_count": agent.token_count(),
        "tool_call_count": agent.tool_call_count(),
    })))
}

/// POST /v1/agents/:id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<serde_json::Value> {
    let cancelled = state.scheduler.cancel(id);
    Json(serde_json::json!({ "cancelled": cancelled }))
}
