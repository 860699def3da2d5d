//! The sub-agent scheduler (C6): bounded spawner, worker loop, cancel, and
//! periodic reap.
//!
//! Grounded on `gateway/src/runtime/agent.rs::run_agent` for the
//! spawn/drain/cleanup shape, generalized from config-driven named
//! delegation into a genuine bounded dynamic pool with admission control.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use pryx_bus::Bus;
use pryx_domain::trace_event::{EventKind, TraceEvent};
use pryx_domain::{Error, Result};
use pryx_providers::traits::{ChatRequest, LlmProvider};
use uuid::Uuid;

use crate::agent::SubAgent;

const CANNED_PREAMBLE: &str =
    "You are a specialized sub-agent. Complete the following task precisely and return only the result.";

pub const DEFAULT_MAX_AGENTS: usize = 10;
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Resolves a provider id to a concrete client. Unknown ids fail
/// `InvalidConfig("unsupported provider")` rather than panicking — the only
/// part of "provider construction" still in scope, since concrete HTTP
/// clients are not (spec §1 non-goal).
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider_id: impl Into<String>, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider_id.into(), provider);
    }

    pub fn get(&self, provider_id: &str) -> Result<Arc<dyn LlmProvider>> {
        self.providers
            .get(provider_id)
            .cloned()
            .ok_or_else(|| Error::InvalidConfig("unsupported provider".to_string()))
    }
}

pub struct Scheduler {
    agents: Mutex<HashMap<Uuid, Arc<SubAgent>>>,
    max_agents: usize,
    bus: Bus,
    providers: Arc<ProviderRegistry>,
}

impl Scheduler {
    pub fn new(bus: Bus, max_agents: usize, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            agents: Mutex::new(HashMap::new()),
            max_agents,
            bus,
            providers,
        }
    }

    pub fn live_count(&self) -> usize {
        self.agents.lock().values().filter(|a| !a.is_terminal()).count()
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<SubAgent>> {
        self.agents.lock().get(&id).cloned()
    }

    /// Admission, agent-id assignment, and worker task spawn. Admission is
    /// serialized: the check-and-insert happens while holding the table
    /// lock, so two racing spawns at capacity never both succeed.
    pub fn spawn(
        &self,
        parent_id: Option<Uuid>,
        session_id: Uuid,
        task: &str,
        system_context: &str,
        provider_id: &str,
    ) -> Result<Arc<SubAgent>> {
        let provider = self.providers.get(provider_id)?;

        let mut agents = self.agents.lock();
        let live = agents.values().filter(|a| !a.is_terminal()).count();
        if live >= self.max_agents {
            return Err(Error::ResourceExhausted(format!(
                "max sub-agents reached ({})",
                self.max_agents
            )));
        }

        let agent = SubAgent::new(parent_id, session_id, system_context);
        agents.insert(agent.id, agent.clone());
        drop(agents);

        let bus = self.bus.clone();
        let worker_agent = agent.clone();
        let task_owned = task.to_string();
        tokio::spawn(async move {
            run_worker(worker_agent, provider, bus, task_owned).await;
        });

        Ok(agent)
    }

    /// Idempotent: cancelling an unknown or already-terminal agent returns
    /// `false` rather than erroring.
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.agents.lock().get(&id) {
            Some(agent) => agent.try_cancel(),
            None => false,
        }
    }

    /// Removes terminal agents older than `max_age`. Publishes nothing.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let now = chrono::Utc::now();
        let mut agents = self.agents.lock();
        let before = agents.len();
        agents.retain(|_, agent| {
            if !agent.is_terminal() {
                return true;
            }
            let age = now.signed_duration_since(agent.created_at);
            age.to_std().map(|age| age < max_age).unwrap_or(true)
        });
        before - agents.len()
    }

    /// Creates a new, empty session id. Copying message history from the
    /// source session is left as a future extension.
    pub fn fork(&self, _source_session_id: Uuid) -> Uuid {
        Uuid::new_v4()
    }
}

async fn run_worker(agent: Arc<SubAgent>, provider: Arc<dyn LlmProvider>, bus: Bus, task: String) {
    if !agent.try_start() {
        return;
    }

    bus.publish(
        TraceEvent::new(EventKind::SubagentStarted, Some(agent.session_id))
            .with_payload("agent_id", agent.id.to_string())
            .with_payload("parent_id", agent.parent_id.map(|p| p.to_string()))
            .with_payload("task", task.clone()),
    );

    if agent.cancel_token().is_cancelled() {
        agent.try_cancel();
        return;
    }

    let started = Instant::now();
    let request = ChatRequest {
        system: agent.system_context.clone(),
        user: format!("{CANNED_PREAMBLE}\n\n{task}"),
        model: None,
        max_tokens: None,
        streaming: false,
    };

    match provider.chat(request).await {
        Ok(response) => {
            if agent.cancel_token().is_cancelled() {
                agent.try_cancel();
                return;
            }
            agent.add_tokens((response.prompt_tokens + response.completion_tokens) as u64);
            if !agent.try_complete() {
                // Cancelled between the cancellation check above and here.
                return;
            }
            let elapsed_ms = started.elapsed().as_millis() as u64;
            bus.publish(
                TraceEvent::new(EventKind::SubagentCompleted, Some(agent.session_id))
                    .with_payload("agent_id", agent.id.to_string())
                    .with_payload("status", "completed")
                    .with_payload("elapsed_ms", elapsed_ms)
                    .with_payload("output", response.content.clone())
                    .with_payload("tokens", agent.token_count())
                    .done(),
            );
            bus.publish(
                TraceEvent::new(EventKind::SessionMessage, Some(agent.session_id))
                    .with_payload("agent_id", agent.id.to_string())
                    .with_payload("content", response.content),
            );
        }
        Err(e) => {
            if !agent.try_fail() {
                return;
            }
            let elapsed_ms = started.elapsed().as_millis() as u64;
            bus.publish(
                TraceEvent::new(EventKind::SubagentCompleted, Some(agent.session_id))
                    .with_payload("agent_id", agent.id.to_string())
                    .with_payload("status", "failed")
                    .with_payload("elapsed_ms", elapsed_ms)
                    .failed(e.to_string()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentStatus;
    use pryx_providers::mock::MockProvider;

    fn scheduler(max_agents: usize) -> Scheduler {
        let mut providers = ProviderRegistry::new();
        providers.register("mock", Arc::new(MockProvider::new("mock", "mock response")));
        Scheduler::new(Bus::new(), max_agents, Arc::new(providers))
    }

    #[tokio::test]
    async fn spawn_runs_to_completion_with_mock_provider() {
        let sched = scheduler(DEFAULT_MAX_AGENTS);
        let agent = sched
            .spawn(None, Uuid::new_v4(), "do the thing", "ctx", "mock")
            .unwrap();

        for _ in 0..50 {
            if agent.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(agent.status(), AgentStatus::Completed);
        assert!(agent.token_count() > 0);
    }

    #[tokio::test]
    async fn spawn_refuses_past_max_agents() {
        let sched = scheduler(1);
        let _first = sched
            .spawn(None, Uuid::new_v4(), "task one", "ctx", "mock")
            .unwrap();
        // The live agent table slot is occupied (even once completed, it's
        // only reclaimed by cleanup), so a cap of 1 should immediately
        // reject the next spawn while the first agent is still live.
        let second = sched.spawn(None, Uuid::new_v4(), "task two", "ctx", "mock");
        assert!(matches!(second, Err(Error::ResourceExhausted(_))));
    }

    #[tokio::test]
    async fn spawn_unknown_provider_fails_invalid_config() {
        let sched = scheduler(DEFAULT_MAX_AGENTS);
        let err = sched
            .spawn(None, Uuid::new_v4(), "task", "ctx", "nonexistent")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn cancel_before_worker_starts_prevents_completion() {
        let sched = scheduler(DEFAULT_MAX_AGENTS);
        let agent = sched
            .spawn(None, Uuid::new_v4(), "task", "ctx", "mock")
            .unwrap();
        sched.cancel(agent.id);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(agent.status(), AgentStatus::Cancelled);
    }

    #[test]
    fn cancel_unknown_agent_returns_false() {
        let sched = scheduler(DEFAULT_MAX_AGENTS);
        assert!(!sched.cancel(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn cleanup_removes_only_aged_terminal_agents() {
        let sched = scheduler(DEFAULT_MAX_AGENTS);
        let agent = sched
            .spawn(None, Uuid::new_v4(), "task", "ctx", "mock")
            .unwrap();
        sched.cancel(agent.id);

        // Not aged yet: a 1-hour cutoff shouldn't remove a just-created agent.
        assert_eq!(sched.cleanup(Duration::from_secs(3600)), 0);
        // A zero-duration cutoff removes any terminal agent immediately.
        assert_eq!(sched.cleanup(Duration::from_secs(0)), 1);
        assert!(sched.get(agent.id).is_none());
    }

    #[test]
    fn fork_returns_a_fresh_session_id() {
        let sched = scheduler(DEFAULT_MAX_AGENTS);
        let source = Uuid::new_v4();
        let forked = sched.fork(source);
        assert_ne!(forked, source);
    }
}
