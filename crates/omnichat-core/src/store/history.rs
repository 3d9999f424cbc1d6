//! Conversation history store — SQLite-backed message transcript.
//!
//! Owns the durable `messages` table. The store assigns ids and
//! timestamps; rows are immutable once inserted (the only mutations are
//! the deletion operations below). Timestamps use SQLite's
//! `STRFTIME('%Y-%m-%d %H:%M:%f','now')`, which is non-decreasing per
//! insertion; ties are broken by id order on read.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use tracing::debug;

use crate::types::{Message, Role};

/// SQLite timestamp layout (fractional seconds, no timezone).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// ─────────────────────────────────────────────
// HistoryStore
// ─────────────────────────────────────────────

/// Append-mostly store of conversation messages.
///
/// Thread-safe: the connection sits behind a `Mutex`, so concurrent turns
/// serialize their reads/appends.
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    /// Open (or create) the history database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(std::time::Duration::from_secs(30))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%d %H:%M:%f', 'now'))
            )",
            [],
        )?;
        Ok(HistoryStore {
            conn: Mutex::new(conn),
        })
    }

    /// Append a message, returning its assigned id.
    pub fn append(&self, role: Role, content: &str) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO messages (role, content, timestamp)
             VALUES (?1, ?2, STRFTIME('%Y-%m-%d %H:%M:%f', 'now'))",
            params![role.as_str(), content],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// The most recent `limit` messages, in chronological order.
    pub fn recent(&self, limit: usize) -> Result<Vec<Message>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, role, content, timestamp FROM messages
             ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (id, role, content, timestamp) = row?;
            messages.push(Message {
                id: Some(id),
                role: role.parse::<Role>()?,
                content,
                timestamp: parse_timestamp(&timestamp)?,
            });
        }
        messages.reverse();
        Ok(messages)
    }

    /// Delete every message.
    pub fn clear(&self) -> Result<()> {
        self.lock().execute("DELETE FROM messages", [])?;
        Ok(())
    }

    /// Delete all messages with the given role. Returns the count removed.
    pub fn clear_by_role(&self, role: Role) -> Result<usize> {
        let count = self
            .lock()
            .execute("DELETE FROM messages WHERE role = ?1", params![role.as_str()])?;
        debug!(role = role.as_str(), count, "cleared messages by role");
        Ok(count)
    }

    /// Delete messages whose date falls within `[start, end]` (inclusive).
    pub fn clear_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        let count = self.lock().execute(
            "DELETE FROM messages WHERE date(timestamp) BETWEEN ?1 AND ?2",
            params![
                start.format("%Y-%m-%d").to_string(),
                end.format("%Y-%m-%d").to_string()
            ],
        )?;
        debug!(%start, %end, count, "cleared messages by date range");
        Ok(count)
    }

    /// Delete one message by id. Returns whether a row was removed.
    pub fn clear_by_id(&self, id: i64) -> Result<bool> {
        let count = self
            .lock()
            .execute("DELETE FROM messages WHERE id = ?1", params![id])?;
        Ok(count > 0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Parse a stored timestamp, with and without fractional seconds.
fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))?;
    Ok(naive.and_utc())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HistoryStore {
        HistoryStore::in_memory().unwrap()
    }

    #[test]
    fn append_returns_increasing_ids() {
        let store = store();
        let a = store.append(Role::User, "first").unwrap();
        let b = store.append(Role::Assistant, "second").unwrap();
        assert!(b > a);
    }

    #[test]
    fn recent_is_chronological() {
        let store = store();
        for i in 0..5 {
            store.append(Role::User, &format!("msg {i}")).unwrap();
        }
        let messages = store.recent(3).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "msg 2");
        assert_eq!(messages[2].content, "msg 4");
        assert!(messages[0].id.unwrap() < messages[2].id.unwrap());
    }

    #[test]
    fn recent_fewer_than_limit() {
        let store = store();
        store.append(Role::User, "only one").unwrap();
        assert_eq!(store.recent(50).unwrap().len(), 1);
    }

    #[test]
    fn recent_parses_roles_and_timestamps() {
        let store = store();
        store.append(Role::System, "observation").unwrap();
        let messages = store.recent(1).unwrap();
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].timestamp.timestamp() > 0);
    }

    #[test]
    fn clear_removes_everything() {
        let store = store();
        store.append(Role::User, "a").unwrap();
        store.append(Role::Assistant, "b").unwrap();
        store.clear().unwrap();
        assert!(store.recent(10).unwrap().is_empty());
    }

    #[test]
    fn clear_by_role_counts() {
        let store = store();
        store.append(Role::User, "u1").unwrap();
        store.append(Role::User, "u2").unwrap();
        store.append(Role::Assistant, "a1").unwrap();

        let removed = store.clear_by_role(Role::User).unwrap();
        assert_eq!(removed, 2);

        let remaining = store.recent(10).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].role, Role::Assistant);
    }

    #[test]
    fn clear_by_date_range_today() {
        let store = store();
        store.append(Role::User, "today's message").unwrap();

        let today = chrono::Utc::now().date_naive();
        let removed = store.clear_by_date_range(today, today).unwrap();
        assert_eq!(removed, 1);
        assert!(store.recent(10).unwrap().is_empty());
    }

    #[test]
    fn clear_by_date_range_outside() {
        let store = store();
        store.append(Role::User, "kept").unwrap();

        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2000, 12, 31).unwrap();
        assert_eq!(store.clear_by_date_range(start, end).unwrap(), 0);
        assert_eq!(store.recent(10).unwrap().len(), 1);
    }

    #[test]
    fn clear_by_id() {
        let store = store();
        let id = store.append(Role::User, "target").unwrap();
        assert!(store.clear_by_id(id).unwrap());
        assert!(!store.clear_by_id(id).unwrap());
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let store = HistoryStore::open(&path).unwrap();
            store.append(Role::User, "durable").unwrap();
        }

        let store = HistoryStore::open(&path).unwrap();
        let messages = store.recent(10).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "durable");
    }

    #[test]
    fn parse_timestamp_both_layouts() {
        assert!(parse_timestamp("2026-08-06 10:30:00.123").is_ok());
        assert!(parse_timestamp("2026-08-06 10:30:00").is_ok());
        assert!(parse_timestamp("not a timestamp").is_err());
    }
}
