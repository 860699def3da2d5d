use axum::extract::State;
use axum::response::Json;

use crate::state::AppState;

/// GET /v1/health — liveness probe, no auth required.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sub_agents": state.scheduler.live_count(),
        "skills": state.skills.len(),
    }))
}
