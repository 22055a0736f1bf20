use std::path::{Path, PathBuf};
use std::time::Duration;

use meteo_core::Reading;
use rusqlite::{params, Connection};
use tracing::{error, info, warn};

use crate::db::{init_db, probe};
use crate::error::Result;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// What [`ReadingStore::ensure_ready`] found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// An existing, valid database was opened.
    Opened,
    /// No file existed; a new database was created.
    Created,
    /// The file was not a valid database and was replaced by an empty one.
    Repaired,
}

/// One row of the `Readings` table.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReading {
    pub id: i64,
    pub timestamp: String,
    pub source_url: String,
    pub is_available: bool,
    pub payload_json: Option<String>,
    pub error_message: Option<String>,
}

/// Append-only history of readings in a SQLite file.
///
/// Every call opens its own connection; nothing is held between cycles.
#[derive(Debug, Clone)]
pub struct ReadingStore {
    path: PathBuf,
}

impl ReadingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make the database usable. Idempotent.
    ///
    /// An existing file that fails the probe query is deleted and recreated,
    /// which discards all stored history.
    pub fn ensure_ready(&self) -> Result<Bootstrap> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut outcome = Bootstrap::Created;
        if self.path.exists() {
            outcome = Bootstrap::Opened;
            if let Err(e) = self.open().and_then(|conn| Ok(probe(&conn)?)) {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "database file is corrupt; deleting it and starting an empty history"
                );
                remove_database_files(&self.path)?;
                outcome = Bootstrap::Repaired;
            }
        }

        let conn = self.open()?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        init_db(&conn)?;

        info!(path = %self.path.display(), ?outcome, "reading store ready");
        Ok(outcome)
    }

    /// Insert one reading. Returns the new row id.
    pub fn append(&self, reading: &Reading) -> Result<i64> {
        let payload_json = reading.payload().map(serde_json::to_string).transpose()?;

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO Readings
             (Timestamp, SourceUrl, IsAvailable, PayloadJson, ErrorMessage)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                reading.timestamp_iso(),
                reading.source_url(),
                reading.is_available(),
                payload_json,
                reading.error_message(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Newest readings first.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredReading>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT Id, Timestamp, SourceUrl, IsAvailable, PayloadJson, ErrorMessage
             FROM Readings ORDER BY Timestamp DESC, Id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(StoredReading {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    source_url: row.get(2)?,
                    is_available: row.get(3)?,
                    payload_json: row.get(4)?,
                    error_message: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.open()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM Readings", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

/// Remove the database file and any SQLite side files next to it.
fn remove_database_files(path: &Path) -> std::io::Result<()> {
    std::fs::remove_file(path)?;
    for suffix in ["-wal", "-shm", "-journal"] {
        let mut side = path.as_os_str().to_owned();
        side.push(suffix);
        match std::fs::remove_file(&side) {
            Ok(()) => warn!(path = ?side, "removed stale SQLite side file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, ReadingStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ReadingStore::new(dir.path().join("meteo.db"));
        (dir, store)
    }

    fn schema(store: &ReadingStore) -> Vec<String> {
        let conn = Connection::open(store.path()).unwrap();
        let mut stmt = conn
            .prepare("SELECT sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap()
    }

    #[test]
    fn creates_schema_on_fresh_path() {
        let (_dir, store) = temp_store();
        assert_eq!(store.ensure_ready().unwrap(), Bootstrap::Created);
        assert_eq!(store.count().unwrap(), 0);

        let ddl = schema(&store).join("\n");
        assert!(ddl.contains("CREATE TABLE Readings"));
        assert!(ddl.contains("IX_Readings_Timestamp"));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReadingStore::new(dir.path().join("nested/data/meteo.db"));
        store.ensure_ready().unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn bootstrap_twice_keeps_schema_and_rows() {
        let (_dir, store) = temp_store();
        store.ensure_ready().unwrap();
        store
            .append(&Reading::unavailable("https://example.com", "HTTP 500 Internal Server Error"))
            .unwrap();
        let before = schema(&store);

        assert_eq!(store.ensure_ready().unwrap(), Bootstrap::Opened);
        assert_eq!(schema(&store), before);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn corrupt_file_is_replaced_with_empty_database() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), vec![0x42u8; 4096]).unwrap();

        assert_eq!(store.ensure_ready().unwrap(), Bootstrap::Repaired);
        assert_eq!(store.count().unwrap(), 0);
        store
            .append(&Reading::available("https://example.com", json!({"a": "1"})))
            .unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn truncated_text_file_is_repaired() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "SQLite format 3 but not really").unwrap();
        assert_eq!(store.ensure_ready().unwrap(), Bootstrap::Repaired);
        assert!(store.recent(10).unwrap().is_empty());
    }

    #[test]
    fn rows_hold_exactly_one_of_payload_or_error() {
        let (_dir, store) = temp_store();
        store.ensure_ready().unwrap();
        store
            .append(&Reading::available("https://example.com/a", json!({"w": {"t": "4"}})))
            .unwrap();
        store
            .append(&Reading::unavailable("https://example.com/a", "Empty response body"))
            .unwrap();

        let rows = store.recent(10).unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_ne!(row.payload_json.is_some(), row.error_message.is_some());
            assert_eq!(row.is_available, row.payload_json.is_some());
        }
    }

    #[test]
    fn payload_round_trips_with_timestamp() {
        let (_dir, store) = temp_store();
        store.ensure_ready().unwrap();
        let reading = Reading::available("https://example.com/a", json!({"w": "x"}));
        store.append(&reading).unwrap();

        let row = &store.recent(1).unwrap()[0];
        assert_eq!(row.timestamp, reading.timestamp_iso());
        let payload: serde_json::Value =
            serde_json::from_str(row.payload_json.as_deref().unwrap()).unwrap();
        assert_eq!(&payload, reading.payload().unwrap());
    }

    #[test]
    fn recent_is_newest_first() {
        let (_dir, store) = temp_store();
        store.ensure_ready().unwrap();
        let first = store.append(&Reading::unavailable("u", "one")).unwrap();
        let second = store.append(&Reading::unavailable("u", "two")).unwrap();
        let rows = store.recent(2).unwrap();
        assert_eq!(rows[0].id, second);
        assert_eq!(rows[1].id, first);
    }

    #[test]
    fn append_without_bootstrap_fails_without_panicking() {
        let (_dir, store) = temp_store();
        assert!(store.append(&Reading::unavailable("u", "x")).is_err());
    }
}
