//! The memory manager (C4): write paths, read paths, and hybrid search over
//! the `memory_entries` / `memory_sources` / `memory_fts` tables owned by
//! `pryx-store`.
//!
//! Grounded on `lanegrid-agtrace/crates/agtrace-index/src/db.rs` for the
//! FTS5 `bm25()` query shape and on `pryx-store`'s own sequential
//! multi-statement writes (no explicit transaction wrapping — the same
//! discipline `Store::add_message` already follows) for `WriteDaily` /
//! `WriteLongterm` / `FlushSession`.

use std::sync::Arc;

use chrono::Utc;
use pryx_bus::Bus;
use pryx_domain::trace_event::{EventKind, TraceEvent};
use pryx_domain::{Error, Result};
use pryx_store::Store;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::types::{ListOptions, MemoryEntry, MemoryEntryType, MemorySource, SearchHit, SearchOptions};

/// Crude by design (spec §9 open question 5): good enough to drive
/// threshold crossings without a tokenizer dependency.
pub fn estimate_tokens(s: &str) -> u64 {
    (s.chars().count() as u64) / 4
}

pub struct MemoryManager {
    store: Arc<Store>,
    bus: Bus,
    max_context_tokens: u64,
    flush_threshold_info: f64,
    flush_threshold_warn: f64,
    flush_threshold_critical: f64,
}

impl MemoryManager {
    pub fn new(
        store: Arc<Store>,
        bus: Bus,
        max_context_tokens: u64,
        flush_threshold_info: f64,
        flush_threshold_warn: f64,
        flush_threshold_critical: f64,
    ) -> Self {
        Self {
            store,
            bus,
            max_context_tokens,
            flush_threshold_info,
            flush_threshold_warn,
            flush_threshold_critical,
        }
    }

    // ── Write paths ──────────────────────────────────────────────────

    pub fn write_daily(&self, date: &str, content: &str, sources: Vec<MemorySource>) -> Result<MemoryEntry> {
        self.write_entry(MemoryEntryType::Daily, Some(date.to_string()), content, sources)
    }

    pub fn write_longterm(&self, content: &str, sources: Vec<MemorySource>) -> Result<MemoryEntry> {
        self.write_entry(MemoryEntryType::Longterm, None, content, sources)
    }

    /// Flushes a session transcript into a standalone `session` entry. The
    /// caller supplies the already-summarized content; this does not
    /// summarize itself.
    pub fn flush_session(&self, content: &str, sources: Vec<MemorySource>) -> Result<MemoryEntry> {
        self.write_entry(MemoryEntryType::Session, None, content, sources)
    }

    fn write_entry(
        &self,
        entry_type: MemoryEntryType,
        date: Option<String>,
        content: &str,
        sources: Vec<MemorySource>,
    ) -> Result<MemoryEntry> {
        let now = Utc::now();
        let entry = MemoryEntry {
            id: Uuid::new_v4(),
            entry_type,
            date,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
            access_count: 0,
            last_accessed: None,
            sources,
        };

        self.store.with_connection(|conn| {
            conn.execute(
                "INSERT INTO memory_entries (id, type, date, content, created_at, updated_at, access_count, last_accessed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL)",
                params![
                    entry.id.to_string(),
                    entry.entry_type.as_str(),
                    entry.date,
                    entry.content,
                    entry.created_at.to_rfc3339(),
                    entry.updated_at.to_rfc3339(),
                ],
            )
            .map_err(sql_err)?;

            for source in &entry.sources {
                conn.execute(
                    "INSERT INTO memory_sources (id, entry_id, source_type, source_path)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        Uuid::new_v4().to_string(),
                        entry.id.to_string(),
                        source.source_type,
                        source.source_path,
                    ],
                )
                .map_err(sql_err)?;
            }
            Ok(())
        })?;

        Ok(entry)
    }

    // ── Read paths ───────────────────────────────────────────────────

    pub fn list(&self, opts: &ListOptions) -> Result<Vec<MemoryEntry>> {
        self.store.with_connection(|conn| {
            let mut sql = String::from(
                "SELECT id, type, date, content, created_at, updated_at, access_count, last_accessed
                 FROM memory_entries WHERE 1=1",
            );
            if opts.entry_type.is_some() {
                sql.push_str(" AND type = ?1");
            }
            if opts.date.is_some() {
                sql.push_str(" AND date = ?2");
            }
            sql.push_str(" ORDER BY created_at DESC");
            if let Some(limit) = opts.limit {
                sql.push_str(&format!(" LIMIT {limit}"));
            }

            let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
            let type_str = opts.entry_type.map(|t| t.as_str().to_string());
            let rows: Vec<MemoryEntry> = match (&type_str, &opts.date) {
                (Some(t), Some(d)) => stmt
                    .query_map(params![t, d], row_to_entry)
                    .map_err(sql_err)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(sql_err)?,
                (Some(t), None) => stmt
                    .query_map(params![t], row_to_entry)
                    .map_err(sql_err)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(sql_err)?,
                (None, _) => stmt
                    .query_map([], row_to_entry)
                    .map_err(sql_err)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(sql_err)?,
            };

            let mut entries = rows;
            for entry in &mut entries {
                entry.sources = load_sources(conn, entry.id)?;
            }
            Ok(entries)
        })
    }

    /// Bumps `access_count` and `last_accessed` on every successful read.
    pub fn get(&self, id: Uuid) -> Result<Option<MemoryEntry>> {
        self.store.with_connection(|conn| {
            let mut entry = conn
                .query_row(
                    "SELECT id, type, date, content, created_at, updated_at, access_count, last_accessed
                     FROM memory_entries WHERE id = ?1",
                    params![id.to_string()],
                    row_to_entry,
                )
                .optional()
                .map_err(sql_err)?;

            if let Some(e) = entry.as_mut() {
                let now = Utc::now();
                conn.execute(
                    "UPDATE memory_entries SET access_count = access_count + 1, last_accessed = ?2 WHERE id = ?1",
                    params![id.to_string(), now.to_rfc3339()],
                )
                .map_err(sql_err)?;
                e.access_count += 1;
                e.last_accessed = Some(now);
                e.sources = load_sources(conn, id)?;
            }
            Ok(entry)
        })
    }

    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.store.with_connection(|conn| {
            conn.execute(
                "DELETE FROM memory_sources WHERE entry_id = ?1",
                params![id.to_string()],
            )
            .map_err(sql_err)?;
            let changed = conn
                .execute("DELETE FROM memory_entries WHERE id = ?1", params![id.to_string()])
                .map_err(sql_err)?;
            if changed == 0 {
                return Err(Error::NotFound(format!("memory entry {id}")));
            }
            Ok(())
        })
    }

    /// Hybrid FTS5/BM25 + (currently no-op) vector search, blended
    /// 0.7 keyword / 0.3 vector per spec §4.4. Bumps access counts on the
    /// returned entries, same as `get`.
    pub fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<SearchHit>> {
        let limit = opts.limit.unwrap_or(20);
        let fts_limit = limit.max(50);

        let raw: Vec<(Uuid, f64)> = self.store.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT memory_entries.id, bm25(memory_fts) AS rank
                     FROM memory_fts
                     JOIN memory_entries ON memory_entries.rowid = memory_fts.rowid
                     WHERE memory_fts MATCH ?1
                     ORDER BY rank
                     LIMIT ?2",
                )
                .map_err(sql_err)?;
            let rows = stmt
                .query_map(params![query, fts_limit as i64], |row| {
                    let id: String = row.get(0)?;
                    let rank: f64 = row.get(1)?;
                    Ok((id, rank))
                })
                .map_err(sql_err)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(sql_err)?;
            Ok(rows
                .into_iter()
                .filter_map(|(id, rank)| Uuid::parse_str(&id).ok().map(|u| (u, rank)))
                .collect())
        })?;

        // bm25() returns lower-is-better, unbounded-negative scores; fold
        // into a bounded (0, 1] "higher is better" score before blending.
        let mut hits: Vec<SearchHit> = Vec::with_capacity(raw.len());
        for (id, rank) in raw {
            let fts_score = 1.0 / (1.0 + rank.max(0.0));
            let vector_score = 0.0; // no embedding backend wired up yet
            let blended = 0.7 * fts_score + 0.3 * vector_score;
            if let Some(entry) = self.get(id)? {
                hits.push(SearchHit { entry, score: blended });
            }
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    // ── Auto-flush monitor ───────────────────────────────────────────

    /// Checks `used_tokens` against the configured context budget and
    /// publishes the first threshold crossed, if any. Advisory only: the
    /// caller remains responsible for actually compacting the session.
    pub fn check_context_usage(&self, session_id: Uuid, used_tokens: u64, oldest_messages: Vec<Uuid>) {
        if self.max_context_tokens == 0 {
            return;
        }
        let ratio = used_tokens as f64 / self.max_context_tokens as f64;

        if ratio >= self.flush_threshold_critical || ratio >= self.flush_threshold_warn {
            let event = TraceEvent::new(EventKind::MemorySummarizeRequest, Some(session_id))
                .with_payload("oldest_messages", serde_json::json!(oldest_messages))
                .with_payload("compression_ratio", 0.2)
                .with_payload("usage_ratio", ratio);
            self.bus.publish(event);
        } else if ratio >= self.flush_threshold_info {
            let event = TraceEvent::new(EventKind::MemoryWarning, Some(session_id))
                .with_payload("usage_ratio", ratio)
                .with_payload("used_tokens", used_tokens)
                .with_payload("max_context_tokens", self.max_context_tokens);
            self.bus.publish(event);
        }
    }

    /// Publishes the result of a caller-performed compaction. `before` and
    /// `after` are token counts measured by the caller (with
    /// [`estimate_tokens`] or an equivalent estimator).
    pub fn record_summarized(&self, session_id: Uuid, before_tokens: u64, after_tokens: u64) {
        let saved = before_tokens.saturating_sub(after_tokens);
        let event = TraceEvent::new(EventKind::MemorySummarized, Some(session_id))
            .with_payload("tokens_before", before_tokens)
            .with_payload("tokens_after", after_tokens)
            .with_payload("tokens_saved", saved)
            .done();
        self.bus.publish(event);
    }
}

fn sql_err(e: rusqlite::Error) -> Error {
    Error::StorageFailure(e.to_string())
}

fn load_sources(conn: &rusqlite::Connection, entry_id: Uuid) -> Result<Vec<MemorySource>> {
    let mut stmt = conn
        .prepare("SELECT source_type, source_path FROM memory_sources WHERE entry_id = ?1")
        .map_err(sql_err)?;
    let rows = stmt
        .query_map(params![entry_id.to_string()], |row| {
            Ok(MemorySource {
                source_type: row.get(0)?,
                source_path: row.get(1)?,
            })
        })
        .map_err(sql_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(sql_err)?;
    Ok(rows)
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<MemoryEntry> {
    let id: String = row.get(0)?;
    let entry_type: String = row.get(1)?;
    let last_accessed: Option<String> = row.get(7)?;
    Ok(MemoryEntry {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        entry_type: MemoryEntryType::parse(&entry_type).unwrap_or(MemoryEntryType::Longterm),
        date: row.get(2)?,
        content: row.get(3)?,
        created_at: parse_ts(row.get::<_, String>(4)?),
        updated_at: parse_ts(row.get::<_, String>(5)?),
        access_count: row.get::<_, i64>(6)? as u64,
        last_accessed: last_accessed.map(parse_ts),
        sources: Vec::new(),
    })
}

fn parse_ts(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> MemoryManager {
        let store = Arc::new(Store::open_in_memory().unwrap());
        MemoryManager::new(store, Bus::new(), 1000, 0.8, 0.9, 1.0)
    }

    #[test]
    fn write_then_get_round_trips_content() {
        let mgr = manager();
        let entry = mgr.write_longterm("the sky is blue", vec![]).unwrap();
        let fetched = mgr.get(entry.id).unwrap().unwrap();
        assert_eq!(fetched.content, "the sky is blue");
    }

    #[test]
    fn get_increments_access_count_by_exactly_one() {
        let mgr = manager();
        let entry = mgr.write_longterm("remember this", vec![]).unwrap();
        assert_eq!(entry.access_count, 0);
        let first = mgr.get(entry.id).unwrap().unwrap();
        assert_eq!(first.access_count, 1);
        let second = mgr.get(entry.id).unwrap().unwrap();
        assert_eq!(second.access_count, 2);
    }

    #[test]
    fn write_daily_persists_date_and_sources() {
        let mgr = manager();
        let entry = mgr
            .write_daily(
                "2026-07-28",
                "met with the team",
                vec![MemorySource {
                    source_type: "session".into(),
                    source_path: "abc".into(),
                }],
            )
            .unwrap();
        let fetched = mgr.get(entry.id).unwrap().unwrap();
        assert_eq!(fetched.date.as_deref(), Some("2026-07-28"));
        assert_eq!(fetched.sources.len(), 1);
    }

    #[test]
    fn delete_removes_entry_and_its_sources() {
        let mgr = manager();
        let entry = mgr
            .write_longterm(
                "gone soon",
                vec![MemorySource {
                    source_type: "note".into(),
                    source_path: "x".into(),
                }],
            )
            .unwrap();
        mgr.delete(entry.id).unwrap();
        assert!(mgr.get(entry.id).unwrap().is_none());
    }

    #[test]
    fn delete_nonexistent_entry_fails_not_found() {
        let mgr = manager();
        let err = mgr.delete(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn list_orders_newest_first_and_filters_by_type() {
        let mgr = manager();
        mgr.write_daily("2026-07-27", "yesterday", vec![]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        mgr.write_longterm("a fact", vec![]).unwrap();

        let all = mgr.list(&ListOptions::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].entry_type, MemoryEntryType::Longterm);

        let daily_only = mgr
            .list(&ListOptions {
                entry_type: Some(MemoryEntryType::Daily),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(daily_only.len(), 1);
        assert_eq!(daily_only[0].entry_type, MemoryEntryType::Daily);
    }

    #[test]
    fn search_finds_entry_by_keyword() {
        let mgr = manager();
        mgr.write_longterm("the quick brown fox jumps", vec![]).unwrap();
        mgr.write_longterm("completely unrelated content", vec![]).unwrap();

        let hits = mgr.search("fox", &SearchOptions::default()).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].entry.content.contains("fox"));
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn search_with_no_matches_returns_empty() {
        let mgr = manager();
        mgr.write_longterm("apples and oranges", vec![]).unwrap();
        let hits = mgr.search("zephyr", &SearchOptions::default()).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn check_context_usage_publishes_warning_at_info_threshold() {
        let mgr = manager();
        let (mut sub, _cancel) = mgr.bus.subscribe(EventKind::MemoryWarning);
        mgr.check_context_usage(Uuid::new_v4(), 850, vec![]);
        let recv = tokio_test_block_on(sub.recv());
        assert!(recv.is_some());
    }

    #[test]
    fn check_context_usage_publishes_summarize_request_at_warn_threshold() {
        let mgr = manager();
        let (mut sub, _cancel) = mgr.bus.subscribe(EventKind::MemorySummarizeRequest);
        mgr.check_context_usage(Uuid::new_v4(), 950, vec![Uuid::new_v4()]);
        let recv = tokio_test_block_on(sub.recv());
        assert!(recv.is_some());
    }

    #[test]
    fn check_context_usage_is_silent_below_info_threshold() {
        let mgr = manager();
        let (mut sub, _cancel) = mgr.bus.subscribe(EventKind::MemoryWarning);
        mgr.check_context_usage(Uuid::new_v4(), 100, vec![]);
        assert!(sub.is_empty());
    }

    // `bus.publish` / `Subscription::recv` are async but this module's own
    // surface is sync; a tiny current-thread runtime keeps the tests
    // readable without making the whole manager async.
    fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f)
    }
}
