//! Tool catalog store — the durable adapter/tool registry backing the
//! in-memory `ToolRegistry`.
//!
//! Registration is idempotent: registering the same adapter name or tool
//! full-name twice leaves one row and returns the same id both times
//! (`INSERT OR IGNORE` + lookup).

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::adapter::AdapterDescriptor;
use crate::types::ToolDescriptor;

// ─────────────────────────────────────────────
// CatalogStore
// ─────────────────────────────────────────────

/// SQLite-backed adapter/tool catalog.
pub struct CatalogStore {
    conn: Mutex<Connection>,
}

impl CatalogStore {
    /// Open (or create) the catalog database at `path`. The catalog shares
    /// a database file with the history store; both schemas coexist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    /// In-memory catalog for tests.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(std::time::Duration::from_secs(30))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS adapters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                kind TEXT NOT NULL,
                description TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tools (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                adapter_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                full_name TEXT UNIQUE NOT NULL,
                short_desc TEXT,
                example TEXT,
                side_effects BOOLEAN,
                FOREIGN KEY (adapter_id) REFERENCES adapters(id) ON DELETE CASCADE
            )",
            [],
        )?;
        Ok(CatalogStore {
            conn: Mutex::new(conn),
        })
    }

    /// Register an adapter. Idempotent on `name`.
    pub fn register_adapter(&self, name: &str, kind: &str, description: &str) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR IGNORE INTO adapters (name, kind, description) VALUES (?1, ?2, ?3)",
            params![name, kind, description],
        )?;
        let id = conn.query_row(
            "SELECT id FROM adapters WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Register a tool under an adapter. Idempotent on `full_name`.
    #[allow(clippy::too_many_arguments)]
    pub fn register_tool(
        &self,
        adapter_id: i64,
        name: &str,
        full_name: &str,
        short_desc: &str,
        example: &str,
        side_effects: bool,
    ) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR IGNORE INTO tools
             (adapter_id, name, full_name, short_desc, example, side_effects)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![adapter_id, name, full_name, short_desc, example, side_effects],
        )?;
        let id = conn.query_row(
            "SELECT id FROM tools WHERE full_name = ?1",
            params![full_name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Register an adapter and all of its declared operations in one call.
    /// Returns the adapter id.
    pub fn register_descriptor(&self, desc: &AdapterDescriptor) -> Result<i64> {
        let adapter_id = self.register_adapter(&desc.name, &desc.kind, &desc.description)?;
        for op in &desc.operations {
            let full_name = format!("{}.{}", desc.name, op.name);
            let example = serde_json::to_string(&op.example)?;
            self.register_tool(
                adapter_id,
                &op.name,
                &full_name,
                &op.description,
                &example,
                op.side_effects,
            )?;
        }
        debug!(
            adapter = %desc.name,
            tools = desc.operations.len(),
            "registered adapter descriptor"
        );
        Ok(adapter_id)
    }

    /// All registered tools joined with their owning adapter's name.
    pub fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT t.full_name, t.short_desc, t.example, t.side_effects, a.name
             FROM tools t
             JOIN adapters a ON t.adapter_id = a.id
             ORDER BY t.full_name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ToolDescriptor {
                full_name: row.get(0)?,
                description: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                example: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                side_effects: row.get::<_, Option<bool>>(3)?.unwrap_or(false),
                adapter: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{OperationSpec, ParamSpec};
    use serde_json::json;

    fn catalog() -> CatalogStore {
        CatalogStore::in_memory().unwrap()
    }

    fn calendar_descriptor() -> AdapterDescriptor {
        AdapterDescriptor {
            name: "google_calendar".into(),
            kind: "CalendarAdapter".into(),
            description: "Google Calendar integration for managing events".into(),
            operations: vec![OperationSpec::new(
                "list_events",
                "List upcoming events from Google Calendar",
            )
            .with_example(json!({"days": 7}))
            .with_params(vec![ParamSpec::optional("days", json!(7))])],
        }
    }

    #[test]
    fn register_adapter_idempotent() {
        let catalog = catalog();
        let first = catalog
            .register_adapter("gmail", "GmailAdapter", "Gmail integration")
            .unwrap();
        let second = catalog
            .register_adapter("gmail", "GmailAdapter", "Gmail integration")
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn register_tool_idempotent() {
        let catalog = catalog();
        let adapter_id = catalog.register_adapter("gmail", "GmailAdapter", "").unwrap();
        let first = catalog
            .register_tool(adapter_id, "list_emails", "gmail.list_emails", "", "{}", false)
            .unwrap();
        let second = catalog
            .register_tool(adapter_id, "list_emails", "gmail.list_emails", "", "{}", false)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(catalog.list_tools().unwrap().len(), 1);
    }

    #[test]
    fn list_tools_joins_adapter_name() {
        let catalog = catalog();
        catalog.register_descriptor(&calendar_descriptor()).unwrap();

        let tools = catalog.list_tools().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].full_name, "google_calendar.list_events");
        assert_eq!(tools[0].adapter, "google_calendar");
        assert!(!tools[0].side_effects);
        assert_eq!(tools[0].example, r#"{"days":7}"#);
    }

    #[test]
    fn register_descriptor_idempotent() {
        let catalog = catalog();
        let desc = calendar_descriptor();
        let first = catalog.register_descriptor(&desc).unwrap();
        let second = catalog.register_descriptor(&desc).unwrap();
        assert_eq!(first, second);
        assert_eq!(catalog.list_tools().unwrap().len(), 1);
    }

    #[test]
    fn list_tools_empty_catalog() {
        assert!(catalog().list_tools().unwrap().is_empty());
    }

    #[test]
    fn shares_file_with_history_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("omnichat.db");

        let history = crate::store::HistoryStore::open(&path).unwrap();
        history.append(crate::types::Role::User, "hi").unwrap();

        let catalog = CatalogStore::open(&path).unwrap();
        catalog.register_adapter("gmail", "GmailAdapter", "").unwrap();

        assert_eq!(history.recent(10).unwrap().len(), 1);
        assert!(catalog.list_tools().unwrap().is_empty());
    }
}
