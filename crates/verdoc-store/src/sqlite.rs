//! SQLite persistence backend using rusqlite.
//!
//! This is the primary backend for file-backed single-node services.
//! Uses WAL mode by default for concurrent read/write performance. The
//! `(tbl, version)` index plays the role a global secondary index plays in a
//! hosted key-value store: it makes `scan_by_version` cheap without scanning
//! the whole table.
//!
//! # Example
//!
//! ```no_run
//! use verdoc::VersionTag;
//! use verdoc_store::{DocumentStore, SqliteStore};
//!
//! let mut store = SqliteStore::open("catalog.db").unwrap();
//! let payload = serde_json::json!({"sku": "p-1"});
//! store.put("products", "p-1", &VersionTag::new("1"), &payload).unwrap();
//! ```

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use verdoc::{Value, VersionTag, VersionedDocument};

use crate::traits::DocumentStore;

/// SQLite configuration options.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// SQLite journal mode. Defaults to WAL.
    pub journal_mode: JournalMode,
    /// Busy timeout in milliseconds. Defaults to 5000.
    pub busy_timeout_ms: u32,
    /// SQLite page size. Defaults to 4096.
    pub page_size: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5000,
            page_size: 4096,
        }
    }
}

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// Write-Ahead Logging — allows concurrent reads during writes.
    Wal,
    /// Traditional rollback journal.
    Delete,
    /// In-memory journal (fastest, no crash recovery).
    Memory,
}

impl JournalMode {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
            Self::Memory => "MEMORY",
        }
    }
}

/// Error type for the SQLite backend.
#[derive(Debug)]
pub enum SqliteError {
    /// An error from rusqlite.
    Sqlite(rusqlite::Error),
    /// A stored payload is not valid JSON.
    Json(String),
    /// Lock poisoned.
    LockPoisoned,
}

impl std::fmt::Display for SqliteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "sqlite error: {e}"),
            Self::Json(msg) => write!(f, "stored payload is not valid JSON: {msg}"),
            Self::LockPoisoned => write!(f, "sqlite lock poisoned"),
        }
    }
}

impl std::error::Error for SqliteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            Self::Json(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<rusqlite::Error> for SqliteError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

/// SQLite persistence backend.
///
/// Wraps a `rusqlite::Connection` behind a `Mutex` for safe shared access.
/// Creates the schema automatically on first open. Payloads are stored as
/// JSON text.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at the given path with default config.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteError> {
        Self::open_with_config(path, SqliteConfig::default())
    }

    /// Open with custom configuration.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteConfig,
    ) -> Result<Self, SqliteError> {
        let conn = Connection::open(path)?;
        Self::init_connection(&conn, &config)?;
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(&conn, &SqliteConfig::default())?;
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_connection(conn: &Connection, config: &SqliteConfig) -> Result<(), SqliteError> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = {};
             PRAGMA busy_timeout = {};
             PRAGMA page_size = {};
             PRAGMA synchronous = NORMAL;",
            config.journal_mode.as_str(),
            config.busy_timeout_ms,
            config.page_size,
        ))?;
        Ok(())
    }

    fn create_schema(conn: &Connection) -> Result<(), SqliteError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                tbl         TEXT NOT NULL,
                key         TEXT NOT NULL,
                version     TEXT NOT NULL,
                payload     TEXT NOT NULL,
                updated_at  INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (tbl, key)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_version
                ON documents(tbl, version);",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteError> {
        self.conn.lock().map_err(|_| SqliteError::LockPoisoned)
    }

    fn now_ms() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn row_to_document(key: String, version: String, payload: String) -> Result<VersionedDocument, SqliteError> {
        let payload: Value =
            serde_json::from_str(&payload).map_err(|e| SqliteError::Json(e.to_string()))?;
        Ok(VersionedDocument::new(key, version, payload))
    }

    /// Get the current journal mode.
    pub fn journal_mode(&self) -> Result<String, SqliteError> {
        let conn = self.lock()?;
        let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        Ok(mode)
    }
}

impl DocumentStore for SqliteStore {
    type Error = SqliteError;

    fn put(
        &mut self,
        table: &str,
        key: &str,
        version: &VersionTag,
        payload: &Value,
    ) -> Result<(), Self::Error> {
        let json = serde_json::to_string(payload).map_err(|e| SqliteError::Json(e.to_string()))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (tbl, key, version, payload, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(tbl, key)
             DO UPDATE SET version = excluded.version,
                           payload = excluded.payload,
                           updated_at = excluded.updated_at",
            params![table, key, version.as_str(), json, Self::now_ms() as i64],
        )?;
        Ok(())
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<VersionedDocument>, Self::Error> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT version, payload FROM documents WHERE tbl = ?1 AND key = ?2",
                params![table, key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        drop(conn);

        match row {
            Some((version, payload)) => {
                Ok(Some(Self::row_to_document(key.into(), version, payload)?))
            }
            None => Ok(None),
        }
    }

    fn scan_by_version(
        &self,
        table: &str,
        version: &VersionTag,
    ) -> Result<Vec<VersionedDocument>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT key, version, payload FROM documents
             WHERE tbl = ?1 AND version = ?2
             ORDER BY key",
        )?;
        let rows = stmt
            .query_map(params![table, version.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        rows.into_iter()
            .map(|(key, version, payload)| Self::row_to_document(key, version, payload))
            .collect()
    }

    fn delete(&mut self, table: &str, key: &str) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM documents WHERE tbl = ?1 AND key = ?2",
            params![table, key],
        )?;
        Ok(())
    }

    fn delete_all(&mut self, table: &str) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM documents WHERE tbl = ?1", params![table])?;
        Ok(())
    }

    fn list_keys(&self, table: &str) -> Result<Vec<String>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT key FROM documents WHERE tbl = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![table], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn exists(&self, table: &str, key: &str) -> Result<bool, Self::Error> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE tbl = ?1 AND key = ?2",
            params![table, key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
