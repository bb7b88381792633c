//! SQLite storage layer for mailpix.
//!
//! One table, one row per tracking id. Handles schema creation, point
//! lookups and upserts by tracking id, and the two list queries the read
//! API needs. All timestamps are epoch milliseconds.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    NotFound(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Sqlite(e) => write!(f, "sqlite error: {e}"),
            StorageError::Io(e) => write!(f, "io error: {e}"),
            StorageError::NotFound(msg) => write!(f, "not found: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Sqlite(e)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Tracking row stored in the database, one per tracking id.
///
/// `first_opened_at` and `last_opened_at` are initialized to `created_at`
/// as a placeholder; they only carry real open times once `open_count > 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRow {
    pub tracking_id: String,
    /// IP observed at creation time. Immutable after creation.
    pub sender_ip: String,
    pub last_ip: String,
    pub last_user_agent: String,
    pub created_at: u64,
    pub first_opened_at: u64,
    pub last_opened_at: u64,
    pub open_count: u32,
}

// ---------------------------------------------------------------------------
// Storage handle
// ---------------------------------------------------------------------------

/// Main storage handle wrapping a SQLite connection.
pub struct Storage {
    conn: Connection,
}

const TRACKING_COLUMNS: &str = "tracking_id, sender_ip, last_ip, last_user_agent,
             created_at, first_opened_at, last_opened_at, open_count";

impl Storage {
    /// Open or create a database at the given path. Creates schema if needed.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    /// Create an in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    fn create_schema(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tracking (
                tracking_id     TEXT PRIMARY KEY,
                sender_ip       TEXT NOT NULL,
                last_ip         TEXT NOT NULL,
                last_user_agent TEXT NOT NULL,
                created_at      INTEGER NOT NULL,
                first_opened_at INTEGER NOT NULL,
                last_opened_at  INTEGER NOT NULL,
                open_count      INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_tracking_first_opened
                ON tracking(first_opened_at);
            ",
        )?;
        Ok(())
    }

    fn row_from_stmt(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrackingRow> {
        Ok(TrackingRow {
            tracking_id: row.get(0)?,
            sender_ip: row.get(1)?,
            last_ip: row.get(2)?,
            last_user_agent: row.get(3)?,
            created_at: row.get::<_, i64>(4)? as u64,
            first_opened_at: row.get::<_, i64>(5)? as u64,
            last_opened_at: row.get::<_, i64>(6)? as u64,
            open_count: row.get::<_, i64>(7)? as u32,
        })
    }

    /// Insert a new tracking row. Fails if the id already exists.
    pub fn insert_tracking(&self, row: &TrackingRow) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO tracking
             (tracking_id, sender_ip, last_ip, last_user_agent,
              created_at, first_opened_at, last_opened_at, open_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.tracking_id,
                row.sender_ip,
                row.last_ip,
                row.last_user_agent,
                row.created_at as i64,
                row.first_opened_at as i64,
                row.last_opened_at as i64,
                row.open_count as i64,
            ],
        )?;
        Ok(())
    }

    pub fn get_tracking(&self, tracking_id: &str) -> Result<Option<TrackingRow>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRACKING_COLUMNS} FROM tracking WHERE tracking_id = ?1"
        ))?;
        let row = stmt
            .query_row(params![tracking_id], Self::row_from_stmt)
            .optional()?;
        Ok(row)
    }

    /// Write back the mutable fields of a counted open. `sender_ip` and
    /// `created_at` are never touched after creation.
    pub fn update_open(&self, row: &TrackingRow) -> Result<(), StorageError> {
        let affected = self.conn.execute(
            "UPDATE tracking
             SET last_ip = ?1, last_user_agent = ?2,
                 first_opened_at = ?3, last_opened_at = ?4, open_count = ?5
             WHERE tracking_id = ?6",
            params![
                row.last_ip,
                row.last_user_agent,
                row.first_opened_at as i64,
                row.last_opened_at as i64,
                row.open_count as i64,
                row.tracking_id,
            ],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound(row.tracking_id.clone()));
        }
        Ok(())
    }

    /// Rows classified as genuine opens since `since`, newest first.
    ///
    /// Re-derives freshness at read time: rows created within the grace
    /// window of `now` are excluded unless they have more than one counted
    /// open, independently of the recorder's write-time filter.
    pub fn list_recent_opens(
        &self,
        since: u64,
        now: u64,
        grace_ms: u64,
    ) -> Result<Vec<TrackingRow>, StorageError> {
        let cutoff = now.saturating_sub(grace_ms);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRACKING_COLUMNS} FROM tracking
             WHERE first_opened_at > ?1
               AND open_count > 0
               AND (created_at <= ?2 OR open_count > 1)
             ORDER BY first_opened_at DESC"
        ))?;
        let rows = stmt.query_map(params![since as i64, cutoff as i64], Self::row_from_stmt)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Most recent opened rows, newest first, at most `limit`.
    pub fn list_all(&self, limit: u32) -> Result<Vec<TrackingRow>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRACKING_COLUMNS} FROM tracking
             WHERE open_count > 0
             ORDER BY first_opened_at DESC
             LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit as i64], Self::row_from_stmt)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE_MS: u64 = 120_000;

    fn test_storage() -> Storage {
        Storage::open_in_memory().unwrap()
    }

    fn baseline_row(id: &str, ip: &str, created_at: u64) -> TrackingRow {
        TrackingRow {
            tracking_id: id.to_string(),
            sender_ip: ip.to_string(),
            last_ip: ip.to_string(),
            last_user_agent: "test-agent".to_string(),
            created_at,
            first_opened_at: created_at,
            last_opened_at: created_at,
            open_count: 0,
        }
    }

    #[test]
    fn test_schema_creation() {
        let storage = test_storage();
        storage.insert_tracking(&baseline_row("abc", "1.1.1.1", 1000)).unwrap();
    }

    #[test]
    fn test_tracking_crud() {
        let storage = test_storage();

        assert!(storage.get_tracking("abc").unwrap().is_none());

        storage.insert_tracking(&baseline_row("abc", "1.1.1.1", 1000)).unwrap();

        let mut loaded = storage.get_tracking("abc").unwrap().unwrap();
        assert_eq!(loaded.sender_ip, "1.1.1.1");
        assert_eq!(loaded.open_count, 0);
        assert_eq!(loaded.first_opened_at, 1000);

        // Duplicate id violates the primary key
        assert!(storage.insert_tracking(&baseline_row("abc", "9.9.9.9", 2000)).is_err());

        loaded.last_ip = "2.2.2.2".to_string();
        loaded.last_user_agent = "other-agent".to_string();
        loaded.first_opened_at = 5000;
        loaded.last_opened_at = 5000;
        loaded.open_count = 1;
        storage.update_open(&loaded).unwrap();

        let loaded = storage.get_tracking("abc").unwrap().unwrap();
        assert_eq!(loaded.last_ip, "2.2.2.2");
        assert_eq!(loaded.open_count, 1);
        // Creation-time fields untouched
        assert_eq!(loaded.sender_ip, "1.1.1.1");
        assert_eq!(loaded.created_at, 1000);
    }

    #[test]
    fn test_update_open_unknown_id() {
        let storage = test_storage();
        let row = baseline_row("ghost", "1.1.1.1", 1000);
        assert!(matches!(
            storage.update_open(&row),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_recent_opens_excludes_unopened() {
        let storage = test_storage();
        storage.insert_tracking(&baseline_row("abc", "1.1.1.1", 1000)).unwrap();

        let recent = storage.list_recent_opens(0, 10_000_000, GRACE_MS).unwrap();
        assert!(recent.is_empty());
    }

    #[test]
    fn test_recent_opens_freshness_recheck() {
        let storage = test_storage();
        let now = 10_000_000;

        // Opened once, but created within the grace window of `now`:
        // excluded until either the window passes or a second open lands.
        let mut fresh = baseline_row("fresh", "1.1.1.1", now - 30_000);
        fresh.first_opened_at = now - 10_000;
        fresh.last_opened_at = now - 10_000;
        fresh.open_count = 1;
        storage.insert_tracking(&fresh).unwrap();

        let recent = storage.list_recent_opens(0, now, GRACE_MS).unwrap();
        assert!(recent.is_empty());

        // Second open overrides the freshness exclusion
        fresh.open_count = 2;
        storage.update_open(&fresh).unwrap();
        let recent = storage.list_recent_opens(0, now, GRACE_MS).unwrap();
        assert_eq!(recent.len(), 1);

        // An old record with one open is included as-is
        let mut old = baseline_row("old", "1.1.1.1", now - 600_000);
        old.first_opened_at = now - 5_000;
        old.last_opened_at = now - 5_000;
        old.open_count = 1;
        storage.insert_tracking(&old).unwrap();
        let recent = storage.list_recent_opens(0, now, GRACE_MS).unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_recent_opens_since_and_ordering() {
        let storage = test_storage();
        let now = 10_000_000;

        for (id, first_opened) in [("a", now - 400_000), ("b", now - 300_000), ("c", now - 200_000)]
        {
            let mut row = baseline_row(id, "1.1.1.1", now - 900_000);
            row.first_opened_at = first_opened;
            row.last_opened_at = first_opened;
            row.open_count = 1;
            storage.insert_tracking(&row).unwrap();
        }

        // `since` is exclusive: a row opened exactly at `since` is skipped
        let recent = storage
            .list_recent_opens(now - 400_000, now, GRACE_MS)
            .unwrap();
        let ids: Vec<&str> = recent.iter().map(|r| r.tracking_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_list_all_limit() {
        let storage = test_storage();
        let now = 10_000_000;

        for i in 0u64..5 {
            let mut row = baseline_row(&format!("id-{i}"), "1.1.1.1", now - 900_000);
            row.first_opened_at = now - 100_000 - i * 1000;
            row.last_opened_at = row.first_opened_at;
            row.open_count = 1;
            storage.insert_tracking(&row).unwrap();
        }
        // One baseline row that must never show up
        storage.insert_tracking(&baseline_row("unopened", "1.1.1.1", now)).unwrap();

        let all = storage.list_all(3).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].tracking_id, "id-0");

        let all = storage.list_all(100).unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|r| r.open_count > 0));
    }
}
