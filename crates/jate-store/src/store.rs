use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use crate::{Result, StoreError};

/// Current schema version, recorded in `PRAGMA user_version` on first creation
const SCHEMA_VERSION: i64 = 1;

/// One persisted save of the editor's full text body
///
/// Records are append-only: the store never updates or deletes them, and
/// `latest` always picks the highest id. The full history stays on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSnapshot {
    pub id: i64,
    pub content: String,
}

/// Durable note storage over SQLite
///
/// SQLite was chosen because:
/// - Zero-config embedded database
/// - Auto-increment ids give us snapshot ordering for free
/// - Battle-tested and reliable
/// - Doesn't require a separate process
///
/// The connection sits behind a mutex so one store handle can be shared
/// page-wide; SQLite serializes the transactions underneath.
pub struct NoteStore {
    conn: Mutex<Connection>,
}

impl NoteStore {
    /// Open (or create) the note database at the given path.
    ///
    /// Idempotent: if the `jate` table already exists nothing is touched, so
    /// reopening across sessions never clears history. Errors here mean the
    /// underlying storage is unavailable (locked file, restricted profile
    /// directory) and callers should fall back to non-durable storage.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, mostly for tests. Same schema, no durability.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'jate'",
            [],
            |row| row.get(0),
        )?;
        if existing > 0 {
            // Table already there - do not recreate, do not clear
            return Ok(());
        }

        conn.execute(
            "CREATE TABLE IF NOT EXISTS jate (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL
            )",
            [],
        )?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        info!("note database created (schema v{})", SCHEMA_VERSION);
        Ok(())
    }

    /// Persist a new snapshot of the note body.
    ///
    /// Failures (quota, aborted transaction) are logged and swallowed: the
    /// caller keeps the content in its scratch tier, so nothing is lost for
    /// the session even when the write doesn't stick.
    pub fn append(&self, content: &str) {
        if let Err(e) = self.try_append(content) {
            warn!("failed to persist note snapshot: {}", e);
        }
    }

    fn try_append(&self, content: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        conn.execute("INSERT INTO jate (content) VALUES (?1)", params![content])?;
        Ok(())
    }

    /// Content of the most recently appended snapshot.
    ///
    /// Ordering is explicit (`ORDER BY id DESC`), never an accident of
    /// iteration order. An empty store or a failed read both come back as an
    /// empty string - "no prior content", not an error.
    pub fn latest(&self) -> String {
        match self.try_latest() {
            Ok(Some(content)) => content,
            Ok(None) => String::new(),
            Err(e) => {
                warn!("failed to read latest note snapshot: {}", e);
                String::new()
            }
        }
    }

    fn try_latest(&self) -> Result<Option<String>> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let content = conn
            .query_row(
                "SELECT content FROM jate ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }

    /// Every snapshot ever saved, oldest first.
    pub fn history(&self) -> Result<Vec<NoteSnapshot>> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare("SELECT id, content FROM jate ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(NoteSnapshot {
                id: row.get(0)?,
                content: row.get(1)?,
            })
        })?;
        let mut snapshots = Vec::new();
        for snapshot in rows {
            snapshots.push(snapshot?);
        }
        Ok(snapshots)
    }

    /// Number of snapshots on disk.
    pub fn len(&self) -> Result<u64> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM jate", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
