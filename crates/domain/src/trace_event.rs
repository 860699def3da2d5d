//! The bus-visible `TraceEvent` data type (spec §3, §6.4).
//!
//! This is distinct from `tracing`-based diagnostic logging: it is a typed
//! record published onto the event bus (C1) and consumed by subscribers
//! (WebSocket clients, the memory auto-flush monitor, the audit handler).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of wire-visible event kinds (spec §6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ToolCall,
    Approval,
    Message,
    Error,
    #[serde(rename = "subagent.started")]
    SubagentStarted,
    #[serde(rename = "subagent.completed")]
    SubagentCompleted,
    #[serde(rename = "session.stats")]
    SessionStats,
    #[serde(rename = "memory.warning")]
    MemoryWarning,
    #[serde(rename = "memory.summarize_request")]
    MemorySummarizeRequest,
    #[serde(rename = "memory.summarized")]
    MemorySummarized,
    #[serde(rename = "session.archived")]
    SessionArchived,
    #[serde(rename = "sessions.cleaned")]
    SessionsCleaned,
    #[serde(rename = "session.created")]
    SessionCreated,
    #[serde(rename = "session.message")]
    SessionMessage,
}

impl EventKind {
    /// Wire name exactly as it appears in the bus frame / §6.4 catalogue.
    pub fn wire_name(&self) -> &'static str {
        match self {
            EventKind::ToolCall => "tool_call",
            EventKind::Approval => "approval",
            EventKind::Message => "message",
            EventKind::Error => "error",
            EventKind::SubagentStarted => "subagent.started",
            EventKind::SubagentCompleted => "subagent.completed",
            EventKind::SessionStats => "session.stats",
            EventKind::MemoryWarning => "memory.warning",
            EventKind::MemorySummarizeRequest => "memory.summarize_request",
            EventKind::MemorySummarized => "memory.summarized",
            EventKind::SessionArchived => "session.archived",
            EventKind::SessionsCleaned => "sessions.cleaned",
            EventKind::SessionCreated => "session.created",
            EventKind::SessionMessage => "session.message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Running,
    Done,
    Error,
}

/// `{kind, session_id, timestamp, payload map}` per spec §3/§4.1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub session_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: TraceStatus,
    pub error: Option<String>,
    #[serde(default)]
    pub payload: HashMap<String, serde_json::Value>,
}

impl TraceEvent {
    pub fn new(kind: EventKind, session_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            session_id,
            parent_id: None,
            agent_id: None,
            started_at: Utc::now(),
            ended_at: None,
            status: TraceStatus::Running,
            error: None,
            payload: HashMap::new(),
        }
    }

    pub fn with_payload(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn done(mut self) -> Self {
        self.status = TraceStatus::Done;
        self.ended_at = Some(Utc::now());
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = TraceStatus::Error;
        self.error = Some(error.into());
        self.ended_at = Some(Utc::now());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_spec_catalogue() {
        assert_eq!(EventKind::SubagentStarted.wire_name(), "subagent.started");
        assert_eq!(EventKind::MemoryWarning.wire_name(), "memory.warning");
        assert_eq!(EventKind::SessionsCleaned.wire_name(), "sessions.cleaned");
    }

    #[test]
    fn new_event_starts_running_with_no_end_time() {
        let ev = TraceEvent::new(EventKind::Message, None);
        assert_eq!(ev.status, TraceStatus::Running);
        assert!(ev.ended_at.is_none());
    }

    #[test]
    fn done_sets_terminal_status_and_end_time() {
        let ev = TraceEvent::new(EventKind::ToolCall, None).done();
        assert_eq!(ev.status, TraceStatus::Done);
        assert!(ev.ended_at.is_some());
    }
}
