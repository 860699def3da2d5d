//! Long-term and session memory (C4): SQLite-backed entries searchable by
//! keyword (FTS5/BM25) with a hybrid-scoring hook for a future vector
//! channel, plus a context-usage monitor that advises callers to
//! summarize before the configured token budget is exceeded.

pub mod manager;
pub mod types;

pub use manager::{estimate_tokens, MemoryManager};
pub use types::{ListOptions, MemoryEntry, MemoryEntryType, MemorySource, SearchHit, SearchOptions};
