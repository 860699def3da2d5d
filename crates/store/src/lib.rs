//! SQLite-backed persistence (C2): sessions, messages, and the memory
//! tables consumed by `pryx-memory`. Single writer-owned connection, guarded
//! by a mutex — per spec §5, "one writer at a time; readers may be
//! concurrent" is honored at the statement level since SQLite itself
//! serializes writers; this crate does not attempt reader/writer connection
//! splitting.
//!
//! Grounded on `lanegrid-agtrace/crates/agtrace-index/src/db.rs`, since the
//! teacher repo has no SQLite usage anywhere (its session store is a JSON
//! file). `rusqlite` (bundled) is a new dependency added for this crate.

mod schema;

use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use pryx_domain::session::{Message, MessageRole, Session, SessionOrigin};
use pryx_domain::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

pub struct Store {
    conn: Mutex<Connection>,
}

fn sql_err(e: rusqlite::Error) -> Error {
    Error::StorageFailure(e.to_string())
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(sql_err)?;
        conn.execute_batch(schema::SCHEMA).map_err(sql_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sql_err)?;
        conn.execute_batch(schema::SCHEMA).map_err(sql_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub fn create_session(&self, title: &str) -> Result<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
            archived: false,
            origin: None,
        };
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sessions (id, title, created_at, updated_at, archived, origin_json)
             VALUES (?1, ?2, ?3, ?4, 0, NULL)",
            params![
                session.id.to_string(),
                session.title,
                session.created_at.to_rfc3339(),
                session.updated_at.to_rfc3339(),
            ],
        )
        .map_err(sql_err)?;
        Ok(session)
    }

    pub fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, title, created_at, updated_at, archived, origin_json
             FROM sessions WHERE id = ?1",
            params![id.to_string()],
            row_to_session,
        )
        .optional()
        .map_err(sql_err)
    }

    /// Newest-first per spec §4.2.
    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, title, created_at, updated_at, archived, origin_json
                 FROM sessions ORDER BY updated_at DESC",
            )
            .map_err(sql_err)?;
        let rows = stmt
            .query_map([], row_to_session)
            .map_err(sql_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sql_err)?;
        Ok(rows)
    }

    pub fn archive_session(&self, id: Uuid) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "UPDATE sessions SET archived = 1, updated_at = ?2 WHERE id = ?1",
                params![id.to_string(), Utc::now().to_rfc3339()],
            )
            .map_err(sql_err)?;
        if changed == 0 {
            return Err(Error::NotFound(format!("session {id}")));
        }
        Ok(())
    }

    // ── Messages ─────────────────────────────────────────────────────

    /// Fails with `NotFound` if the session does not exist.
    pub fn add_message(&self, session_id: Uuid, role: MessageRole, content: &str) -> Result<Message> {
        let conn = self.conn.lock();
        let exists: Option<String> = conn
            .query_row(
                "SELECT id FROM sessions WHERE id = ?1",
                params![session_id.to_string()],
                |r| r.get(0),
            )
            .optional()
            .map_err(sql_err)?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("session {session_id}")));
        }

        let message = Message {
            id: Uuid::new_v4(),
            session_id,
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        conn.execute(
            "INSERT INTO messages (id, session_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                message.id.to_string(),
                session_id.to_string(),
                message.role.as_str(),
                message.content,
                message.created_at.to_rfc3339(),
            ],
        )
        .map_err(sql_err)?;
        conn.execute(
            "UPDATE sessions SET updated_at = ?2 WHERE id = ?1",
            params![session_id.to_string(), message.created_at.to_rfc3339()],
        )
        .map_err(sql_err)?;
        Ok(message)
    }

    /// Ascending creation order per spec §4.2.
    pub fn get_messages(&self, session_id: Uuid) -> Result<Vec<Message>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, session_id, role, content, created_at
                 FROM messages WHERE session_id = ?1 ORDER BY created_at ASC",
            )
            .map_err(sql_err)?;
        let rows = stmt
            .query_map(params![session_id.to_string()], row_to_message)
            .map_err(sql_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sql_err)?;
        Ok(rows)
    }

    /// Exposes the inner connection to `pryx-memory`, which owns the memory
    /// table operations directly rather than through a re-exported API
    /// surface here. Locking follows the same single-writer discipline as
    /// every other method on this type.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock();
        f(&conn)
    }
}

fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<Session> {
    let id: String = row.get(0)?;
    let origin_json: Option<String> = row.get(5)?;
    let origin: Option<SessionOrigin> = origin_json
        .and_then(|s| serde_json::from_str(&s).ok());
    Ok(Session {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        title: row.get(1)?,
        created_at: parse_ts(row.get::<_, String>(2)?),
        updated_at: parse_ts(row.get::<_, String>(3)?),
        archived: row.get::<_, i64>(4)? != 0,
        origin,
    })
}

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Message> {
    let id: String = row.get(0)?;
    let session_id: String = row.get(1)?;
    let role: String = row.get(2)?;
    Ok(Message {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        session_id: Uuid::parse_str(&session_id).unwrap_or_default(),
        role: MessageRole::parse(&role).unwrap_or(MessageRole::User),
        content: row.get(3)?,
        created_at: parse_ts(row.get::<_, String>(4)?),
    })
}

fn parse_ts(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
