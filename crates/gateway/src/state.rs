use std::sync::Arc;

use parking_lot::RwLock;
use pryx_bus::Bus;
use pryx_domain::config::Config;
use pryx_memory::MemoryManager;
use pryx_providers::Catalog;
use pryx_scheduler::Scheduler;
use pryx_skills::SkillsRegistry;
use pryx_store::Store;

/// Shared application state passed to every HTTP/WS handler.
///
/// Fields are grouped by concern, following the teacher's `AppState`
/// convention, trimmed to the six core components plus the ambient
/// security fields startup computes once.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    // ── Core services ────────────────────────────────────────────────
    pub bus: Bus,
    pub store: Arc<Store>,
    pub catalog: Arc<RwLock<Catalog>>,
    pub memory: Arc<MemoryManager>,
    pub skills: Arc<SkillsRegistry>,
    pub scheduler: Arc<Scheduler>,

    // ── Security (startup-computed) ──────────────────────────────────
    /// SHA-256 hash of the API bearer token. `None` = dev mode (no auth
    /// enforced), matching the teacher's `api_token_hash` convention.
    pub api_token_hash: Option<Vec<u8>>,
}
