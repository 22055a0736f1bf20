use rusqlite::Connection;

use crate::error::Result;

/// Initialise the history schema in `conn`. Safe on every startup.
///
/// Rows must carry exactly one of `PayloadJson` / `ErrorMessage`, matching
/// `IsAvailable`; the CHECK constraint rejects anything else.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS Readings (
            Id            INTEGER PRIMARY KEY AUTOINCREMENT,
            Timestamp     TEXT    NOT NULL,   -- ISO-8601 UTC
            SourceUrl     TEXT    NOT NULL,
            IsAvailable   INTEGER NOT NULL CHECK (IsAvailable IN (0, 1)),
            PayloadJson   TEXT,
            ErrorMessage  TEXT,
            CHECK (
                (IsAvailable = 1 AND PayloadJson IS NOT NULL AND ErrorMessage IS NULL)
             OR (IsAvailable = 0 AND PayloadJson IS NULL AND ErrorMessage IS NOT NULL)
            )
        );

        CREATE INDEX IF NOT EXISTS IX_Readings_Timestamp ON Readings (Timestamp DESC);
        ",
    )?;
    Ok(())
}

/// Cheap schema-introspection query. Fails on files that are not SQLite.
pub fn probe(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get(0))
}
