//! Schema definition, grounded on
//! `lanegrid-agtrace/crates/agtrace-index/src/db.rs`'s `init_schema()` —
//! multi-statement raw SQL via `execute_batch`, `CREATE TABLE IF NOT EXISTS`
//! plus `CREATE INDEX IF NOT EXISTS`.

pub const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS sessions (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    archived    INTEGER NOT NULL DEFAULT 0,
    origin_json TEXT
);
CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON sessions (updated_at DESC);

CREATE TABLE IF NOT EXISTS messages (
    id          TEXT PRIMARY KEY,
    session_id  TEXT NOT NULL REFERENCES sessions(id),
    role        TEXT NOT NULL,
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_session_created
    ON messages (session_id, created_at ASC);

CREATE TABLE IF NOT EXISTS memory_entries (
    id            TEXT PRIMARY KEY,
    type          TEXT NOT NULL,
    date          TEXT,
    content       TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    access_count  INTEGER NOT NULL DEFAULT 0,
    last_accessed TEXT
);
CREATE INDEX IF NOT EXISTS idx_memory_entries_type ON memory_entries (type);
CREATE INDEX IF NOT EXISTS idx_memory_entries_date ON memory_entries (date);
CREATE INDEX IF NOT EXISTS idx_memory_entries_created_at
    ON memory_entries (created_at DESC);

CREATE TABLE IF NOT EXISTS memory_sources (
    id          TEXT PRIMARY KEY,
    entry_id    TEXT NOT NULL REFERENCES memory_entries(id),
    source_type TEXT NOT NULL,
    source_path TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_memory_sources_entry_id
    ON memory_sources (entry_id);

-- Reserved, unused for this spec: a place to land embeddings once a vector
-- scorer exists. The hybrid search blend treats this channel as a no-op.
CREATE TABLE IF NOT EXISTS memory_vectors (
    entry_id  TEXT PRIMARY KEY REFERENCES memory_entries(id),
    embedding BLOB
);

CREATE VIRTUAL TABLE IF NOT EXISTS memory_fts USING fts5(
    content,
    content='memory_entries',
    content_rowid='rowid',
    tokenize='porter'
);

CREATE TRIGGER IF NOT EXISTS memory_entries_ai AFTER INSERT ON memory_entries BEGIN
    INSERT INTO memory_fts(rowid, content) VALUES (new.rowid, new.content);
END;
CREATE TRIGGER IF NOT EXISTS memory_entries_ad AFTER DELETE ON memory_entries BEGIN
    INSERT INTO memory_fts(memory_fts, rowid, content) VALUES ('delete', old.rowid, old.content);
END;
CREATE TRIGGER IF NOT EXISTS memory_entries_au AFTER UPDATE ON memory_entries BEGIN
    INSERT INTO memory_fts(memory_fts, rowid, content) VALUES ('delete', old.rowid, old.content);
    INSERT INTO memory_fts(rowid, content) VALUES (new.rowid, new.content);
END;
"#;
