//! Model routing endpoints wrapping `pryx-providers`' resolver/router (C3).

use axum::extract::State;
use axum::response::Json;

use pryx_providers::{resolve, select, Request, RouteRequest};

use crate::state::AppState;

/// POST /v1/router/resolve — single-candidate admission check.
pub async fn resolve_model(
    State(state): State<AppState>,
    Json(req): Json<Request>,
) -> Json<serde_json::Value> {
    let catalog = state.catalog.read();
    let resolution = resolve(
        &catalog,
        &req,
        state.config.router.max_tools_per_request,
        state.config.router.allow_unknown_models,
    );
    Json(serde_json::to_value(resolution).unwrap())
}

/// POST /v1/router/select — least-cost selection over a candidate set.
pub async fn select_model(
    State(state): State<AppState>,
    Json(req): Json<RouteRequest>,
) -> Json<serde_json::Value> {
    let catalog = state.catalog.read();
    let resolution = select(&catalog, &req);
    Json(serde_json::to_value(resolution).unwrap())
}
