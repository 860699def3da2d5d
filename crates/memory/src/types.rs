use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryEntryType {
    Daily,
    Longterm,
    Session,
}

impl MemoryEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryEntryType::Daily => "daily",
            MemoryEntryType::Longterm => "longterm",
            MemoryEntryType::Session => "session",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "longterm" => Some(Self::Longterm),
            "session" => Some(Self::Session),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySource {
    pub source_type: String,
    pub source_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: Uuid,
    pub entry_type: MemoryEntryType,
    /// `YYYY-MM-DD`, required for `daily`, empty for `longterm`/`session`
    /// per spec §3 invariant.
    pub date: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub access_count: u64,
    pub last_accessed: Option<DateTime<Utc>>,
    pub sources: Vec<MemorySource>,
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub entry_type: Option<MemoryEntryType>,
    pub date: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub include_fts: bool,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub entry: MemoryEntry,
    pub score: f64,
}
