use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::request::Response;
use crate::{CacheError, Result};

/// One cached response plus the bookkeeping the expiry check needs
#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub status: u16,
    pub body: Vec<u8>,
    /// Unix timestamp of when the entry was written
    pub cached_at: i64,
    /// Build revision, set only for precached entries
    pub revision: Option<String>,
}

impl CachedEntry {
    pub fn into_response(self) -> Response {
        Response::new(self.status, self.body)
    }
}

/// Persistent cache partitions, SQLite underneath
///
/// Every entry lives under a (cache_name, url) composite key, so writes to
/// one partition can never collide with another's even for identical URLs.
/// Last write wins on a racing double-populate, which is fine: responses for
/// the same URL inside the freshness window are interchangeable.
pub struct CacheStorage {
    conn: Mutex<Connection>,
}

impl CacheStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory cache, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                cache_name TEXT NOT NULL,
                url TEXT NOT NULL,
                status INTEGER NOT NULL,
                body BLOB NOT NULL,
                cached_at INTEGER NOT NULL,
                revision TEXT,
                PRIMARY KEY (cache_name, url)
            )",
            [],
        )?;
        Ok(())
    }

    /// Look up an entry in the named partition. Expiry is the caller's
    /// business; this returns whatever is stored, however old.
    pub fn get(&self, cache_name: &str, url: &str) -> Result<Option<CachedEntry>> {
        let conn = self.conn.lock().map_err(|_| CacheError::LockPoisoned)?;
        let entry = conn
            .query_row(
                "SELECT status, body, cached_at, revision FROM cache_entries
                 WHERE cache_name = ?1 AND url = ?2",
                params![cache_name, url],
                |row| {
                    Ok(CachedEntry {
                        status: row.get::<_, i64>(0)? as u16,
                        body: row.get(1)?,
                        cached_at: row.get(2)?,
                        revision: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Store a response under the named partition, stamped with now.
    /// Replaces any previous entry for the same key.
    pub fn put(&self, cache_name: &str, url: &str, response: &Response) -> Result<()> {
        self.put_at(cache_name, url, response, Utc::now().timestamp(), None)
    }

    /// Same as `put` but with an explicit timestamp and optional revision.
    /// The precache path uses the revision; tests use the timestamp to age
    /// entries without a clock trait.
    pub fn put_at(
        &self,
        cache_name: &str,
        url: &str,
        response: &Response,
        cached_at: i64,
        revision: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| CacheError::LockPoisoned)?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (cache_name, url, status, body, cached_at, revision)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                cache_name,
                url,
                response.status as i64,
                response.body,
                cached_at,
                revision
            ],
        )?;
        debug!("cached {} in {}", url, cache_name);
        Ok(())
    }

    /// Number of entries in one partition
    pub fn partition_len(&self, cache_name: &str) -> Result<u64> {
        let conn = self.conn.lock().map_err(|_| CacheError::LockPoisoned)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE cache_name = ?1",
            params![cache_name],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
