//! `AppState` construction and background-task spawning extracted from
//! `main.rs`, mirroring the teacher's `build_app_state`/
//! `spawn_background_tasks` split.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::RwLock;
use pryx_bus::Bus;
use pryx_domain::config::{Config, ConfigSeverity};
use pryx_memory::MemoryManager;
use pryx_providers::mock::MockProvider;
use pryx_providers::embedded_defaults;
use pryx_scheduler::{ProviderRegistry, Scheduler};
use pryx_skills::discover as discover_skills;
use pryx_store::Store;
use sha2::{Digest, Sha256};

use crate::state::AppState;

/// Validate config, initialize every subsystem, return a fully-wired
/// [`AppState`]. Shared boot path used by the `serve` and `doctor` commands.
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Event bus ────────────────────────────────────────────────────
    let bus = Bus::new();
    tracing::info!("event bus ready");

    // ── Store ────────────────────────────────────────────────────────
    let store = Arc::new(
        Store::open(&config.store.database_path).context("opening store database")?,
    );
    tracing::info!(path = %config.store.database_path.display(), "store ready");

    // ── Model catalog ────────────────────────────────────────────────
    let catalog = Arc::new(RwLock::new(embedded_defaults(
        config.router.enable_vision_heuristic,
    )));
    tracing::info!("model catalog seeded with embedded defaults");

    // ── Memory manager ───────────────────────────────────────────────
    let memory = Arc::new(MemoryManager::new(
        store.clone(),
        bus.clone(),
        config.memory.max_context_tokens as u64,
        config.memory.flush_threshold_info,
        config.memory.flush_threshold_warn,
        config.memory.flush_threshold_critical,
    ));
    tracing::info!("memory manager ready");

    // ── Skills ───────────────────────────────────────────────────────
    let worker_count = if config.skills.discovery_workers == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    } else {
        config.skills.discovery_workers
    };
    let (skills, discovery_errors) = discover_skills(
        &config.skills.bundled_path,
        &config.skills.managed_path,
        &config.skills.workspace_path,
        worker_count,
    )
    .await;
    for err in &discovery_errors {
        tracing::warn!(path = %err.path.display(), message = %err.message, "skill discovery error");
    }
    tracing::info!(skills_count = skills.len(), errors = discovery_errors.len(), "skills loaded");
    let skills = Arc::new(skills);

    // ── Provider registry + scheduler ────────────────────────────────
    let mut providers = ProviderRegistry::new();
    providers.register("mock", Arc::new(MockProvider::new("mock", "mock response")));
    let scheduler = Arc::new(Scheduler::new(
        bus.clone(),
        config.scheduler.max_agents,
        Arc::new(providers),
    ));
    tracing::info!(max_agents = config.scheduler.max_agents, "scheduler ready");

    // ── API token (read once, hash for constant-time comparison) ────
    let api_token_hash = match std::env::var("PRYX_API_TOKEN") {
        Ok(token) if !token.is_empty() => {
            tracing::info!("API bearer-token auth enabled");
            Some(Sha256::digest(token.as_bytes()).to_vec())
        }
        _ => {
            tracing::warn!("API bearer-token auth DISABLED — set PRYX_API_TOKEN to enable");
            None
        }
    };

    Ok(AppState {
        config,
        bus,
        store,
        catalog,
        memory,
        skills,
        scheduler,
        api_token_hash,
    })
}

/// Spawn the long-running background tokio tasks. Call after
/// [`build_app_state`] when running the HTTP server; one-shot CLI commands
/// skip this.
pub fn spawn_background_tasks(state: &AppState) {
    // ── Periodic sub-agent table reap ────────────────────────────────
    {
        let scheduler = state.scheduler.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                let removed = scheduler.cleanup(Duration::from_secs(3600));
                if removed > 0 {
                    tracing::info!(removed, "reaped aged sub-agents");
                }
            }
        });
    }
    tracing::info!("background tasks spawned");
}
