//! `SubAgent`: the scheduler's in-memory record of one spawned worker.
//!
//! Status transitions are guarded by the agent's own mutex, never the
//! scheduler's table mutex — the two-level locking rule of spec §4.6.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::cancel::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl AgentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentStatus::Completed | AgentStatus::Failed | AgentStatus::Cancelled
        )
    }
}

pub struct SubAgent {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub session_id: Uuid,
    pub system_context: String,
    pub created_at: DateTime<Utc>,
    status: Mutex<AgentStatus>,
    token_count: AtomicU64,
    tool_call_count: AtomicU64,
    cancel: CancelToken,
}

impl SubAgent {
    pub fn new(parent_id: Option<Uuid>, session_id: Uuid, system_context: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            parent_id,
            session_id,
            system_context: system_context.into(),
            created_at: Utc::now(),
            status: Mutex::new(AgentStatus::Pending),
            token_count: AtomicU64::new(0),
            tool_call_count: AtomicU64::new(0),
            cancel: CancelToken::new(),
        })
    }

    pub fn status(&self) -> AgentStatus {
        *self.status.lock()
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn token_count(&self) -> u64 {
        self.token_count.load(Ordering::Relaxed)
    }

    pub fn tool_call_count(&self) -> u64 {
        self.tool_call_count.load(Ordering::Relaxed)
    }

    pub fn add_tokens(&self, n: u64) {
        self.token_count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_tool_call(&self) {
        self.tool_call_count.fetch_add(1, Ordering::Relaxed);
    }

    /// pending → running. No-op (returns false) if already past pending.
    pub fn try_start(&self) -> bool {
        let mut status = self.status.lock();
        if *status == AgentStatus::Pending {
            *status = AgentStatus::Running;
            true
        } else {
            false
        }
    }

    /// running → completed. No-op if the status isn't running (e.g. it was
    /// cancelled out from under the worker).
    pub fn try_complete(&self) -> bool {
        let mut status = self.status.lock();
        if *status == AgentStatus::Running {
            *status = AgentStatus::Completed;
            true
        } else {
            false
        }
    }

    /// running → failed.
    pub fn try_fail(&self) -> bool {
        let mut status = self.status.lock();
        if *status == AgentStatus::Running {
            *status = AgentStatus::Failed;
            true
        } else {
            false
        }
    }

    /// pending|running → cancelled. Idempotent: cancelling an
    /// already-terminal agent is a no-op, not an error.
    pub fn try_cancel(&self) -> bool {
        self.cancel.cancel();
        let mut status = self.status.lock();
        if !status.is_terminal() {
            *status = AgentStatus::Cancelled;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_agent_starts_pending() {
        let agent = SubAgent::new(None, Uuid::new_v4(), "ctx");
        assert_eq!(agent.status(), AgentStatus::Pending);
    }

    #[test]
    fn normal_lifecycle_pending_running_completed() {
        let agent = SubAgent::new(None, Uuid::new_v4(), "ctx");
        assert!(agent.try_start());
        assert_eq!(agent.status(), AgentStatus::Running);
        assert!(agent.try_complete());
        assert_eq!(agent.status(), AgentStatus::Completed);
    }

    #[test]
    fn terminal_states_are_sticky() {
        let agent = SubAgent::new(None, Uuid::new_v4(), "ctx");
        agent.try_start();
        agent.try_complete();
        assert!(!agent.try_fail());
        assert!(!agent.try_cancel());
        assert_eq!(agent.status(), AgentStatus::Completed);
    }

    #[test]
    fn cancel_from_pending_is_allowed() {
        let agent = SubAgent::new(None, Uuid::new_v4(), "ctx");
        assert!(agent.try_cancel());
        assert_eq!(agent.status(), AgentStatus::Cancelled);
        assert!(agent.cancel_token().is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent() {
        let agent = SubAgent::new(None, Uuid::new_v4(), "ctx");
        assert!(agent.try_cancel());
        assert!(!agent.try_cancel());
    }

    #[test]
    fn cannot_start_an_already_running_agent_twice() {
        let agent = SubAgent::new(None, Uuid::new_v4(), "ctx");
        assert!(agent.try_start());
        assert!(!agent.try_start());
    }
}
