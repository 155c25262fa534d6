//! Durable slot storage for flashforge.
//!
//! A *slot* is a named string value that survives process restarts, the
//! terminal counterpart of a browser local-storage entry. The card store only
//! ever talks to the [`Slot`] trait, so the backing medium can be swapped:
//!
//! - [`SqliteSlot`]: file-backed `SQLite` key-value table (the default)
//! - [`MemorySlot`]: in-process map, used as a fake in tests

pub mod document;
mod memory;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use memory::MemorySlot;

/// Persistence backend holding string values under string keys.
///
/// Serialization is the caller's concern; a slot stores opaque text.
pub trait Slot {
    /// Read the value stored under `key`, or `None` if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value exceeds the backend's quota or the
    /// backend cannot be written.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: Slot + ?Sized> Slot for &mut S {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }
}

/// Reject a value that would exceed an optional byte quota.
pub(crate) fn check_quota(key: &str, value: &str, limit: Option<usize>) -> Result<()> {
    match limit {
        Some(limit) if value.len() > limit => Err(Error::QuotaExceeded {
            key: key.to_string(),
            size: value.len(),
            limit,
        }),
        _ => Ok(()),
    }
}

/// `SQLite`-backed slot storage.
#[derive(Debug)]
pub struct SqliteSlot {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Maximum size of a single value in bytes.
    quota: Option<usize>,
}

impl SqliteSlot {
    /// Open or create a slot database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening slot database at {}", path.display());
        let mut conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Each write is one small row; full sync keeps every mutation durable.
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute_batch("PRAGMA synchronous=FULL;")?;
        debug!("Slot database journal mode: {}", journal_mode);

        migrations::initialize_schema(&mut conn)?;

        info!("Slot database opened at {}", path.display());
        Ok(Self {
            path,
            conn,
            quota: None,
        })
    }

    /// Create an in-memory slot database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&mut conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            quota: None,
        })
    }

    /// Limit the size of any single value written through this slot.
    #[must_use]
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of non-empty slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM slots", [], |row| row.get(0))?;
        Ok(count)
    }

    /// When `key` was last written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM slots WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the database file
    /// can no longer be inspected.
    pub fn stats(&self) -> Result<SlotStats> {
        let slots = self.count()?;

        let value_bytes: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM slots",
            [],
            |row| row.get(0),
        )?;

        let last_write: Option<String> = self
            .conn
            .query_row("SELECT MAX(updated_at) FROM slots", [], |row| row.get(0))
            .optional()?
            .flatten();
        let last_write = last_write
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path)?.len()
        };

        Ok(SlotStats {
            slots,
            value_bytes: u64::try_from(value_bytes).unwrap_or(0),
            last_write,
            db_size_bytes,
        })
    }
}

impl Slot for SqliteSlot {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        check_quota(key, value, self.quota)?;

        self.conn.execute(
            r"
            INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        )?;

        debug!("Wrote {} bytes to slot '{}'", value.len(), key);
        Ok(())
    }
}

/// Statistics about the slot database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotStats {
    /// Number of non-empty slots.
    pub slots: i64,
    /// Total size of all stored values in bytes.
    pub value_bytes: u64,
    /// Most recent write across all slots.
    pub last_write: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
