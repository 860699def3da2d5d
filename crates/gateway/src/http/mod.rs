pub mod auth;
pub mod error;
pub mod health;
pub mod memory;
pub mod router;
pub mod scheduler;
pub mod sessions;
pub mod skills;
pub mod ws;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full HTTP+WS router.
///
/// Routes split into **public** (no auth) and **protected** (gated behind
/// the `PRYX_API_TOKEN` bearer-token middleware); `/ws` checks its own
/// query-param token independently since browsers can't set headers on a
/// WebSocket handshake.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/v1/health", get(health::health))
        .route("/ws", get(ws::ws_handler));

    let protected = Router::new()
        .route("/v1/sessions", post(sessions::create_session))
        .route("/v1/sessions", get(sessions::list_sessions))
        .route("/v1/sessions/:id", get(sessions::get_session))
        .route("/v1/sessions/:id/archive", post(sessions::archive_session))
        .route("/v1/sessions/:id/messages", post(sessions::add_message))
        .route("/v1/sessions/:id/messages", get(sessions::list_messages))
        .route("/v1/memory/daily", post(memory::write_daily))
        .route("/v1/memory/longterm", post(memory::write_longterm))
        .route("/v1/memory", get(memory::list_entries))
        .route("/v1/memory/search", get(memory::search))
        .route("/v1/memory/:id", get(memory::get_entry))
        .route("/v1/memory/:id", delete(memory::delete_entry))
        .route("/v1/skills", get(skills::list_skills))
        .route("/v1/skills/:id/doc", get(skills::read_skill_doc))
        .route("/v1/agents", post(scheduler::spawn))
        .route("/v1/agents/:id", get(scheduler::get))
        .route("/v1/agents/:id/cancel", post(scheduler::cancel))
        .route("/v1/router/resolve", post(router::resolve_model))
        .route("/v1/router/select", post(router::select_model))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_token,
        ));

    public
        .merge(protected)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
