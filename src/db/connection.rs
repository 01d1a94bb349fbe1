//! SQLite connection management for the registry database.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial implementation

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use super::queries;
use crate::error::StoreError;

/// How long a writer waits on another process's lock before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the registry database and make sure the schema exists.
pub fn open_store(db_path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(db_path).map_err(|source| StoreError::ConnectionFailed {
        path: db_path.display().to_string(),
        source,
    })?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the Programs table if absent. Safe on every open.
pub fn ensure_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(queries::CREATE_SCHEMA)?;
    Ok(())
}

/// Check whether the database at `db_path` can be opened.
pub fn check_access(db_path: &Path) -> bool {
    open_store(db_path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_twice() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        let count: i64 = conn
            .query_row(queries::COUNT_ALL, [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("extensions.db");
        match open_store(&path) {
            Err(StoreError::ConnectionFailed { path: p, .. }) => {
                assert!(p.ends_with("extensions.db"))
            }
            other => panic!("expected ConnectionFailed, got {:?}", other.map(|_| ())),
        }
        assert!(!check_access(&path));
    }
}
