//! Query helpers over a borrowed connection.
//!
//! These take `&Connection` so the store can scope one connection per call
//! while tests drive them against an in-memory database.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial implementation

use rusqlite::{params, Connection};
use serde::Serialize;

use super::queries;
use crate::error::StoreError;

/// A registered (program path, extension) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Association {
    pub program_path: String,
    pub extension: String,
}

/// Insert a pair. A duplicate is swallowed by the table's conflict policy.
pub fn insert_association(
    conn: &Connection,
    path: &str,
    extension: &str,
) -> Result<usize, StoreError> {
    let changed = conn.execute(queries::INSERT_ASSOCIATION, params![path, extension])?;
    Ok(changed)
}

/// Delete every pair for `path`. Returns rows removed (zero is fine).
pub fn delete_by_path(conn: &Connection, path: &str) -> Result<usize, StoreError> {
    let removed = conn.execute(queries::DELETE_BY_PATH, params![path])?;
    Ok(removed)
}

/// Program paths registered for exactly `extension`, in store order.
pub fn lookup_by_extension(conn: &Connection, extension: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(queries::SELECT_BY_EXTENSION)?;
    let rows = stmt.query_map(params![extension], |row| row.get::<_, String>(0))?;

    let mut paths = Vec::new();
    for row in rows {
        paths.push(row?);
    }
    Ok(paths)
}

/// Every stored pair.
pub fn list_associations(conn: &Connection) -> Result<Vec<Association>, StoreError> {
    let mut stmt = conn.prepare(queries::SELECT_ALL)?;
    let rows = stmt.query_map([], |row| {
        Ok(Association {
            program_path: row.get(0)?,
            extension: row.get(1)?,
        })
    })?;

    let mut associations = Vec::new();
    for row in rows {
        associations.push(row?);
    }
    Ok(associations)
}

/// Number of stored pairs.
pub fn count_associations(conn: &Connection) -> Result<i64, StoreError> {
    let count = conn.query_row(queries::COUNT_ALL, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::ensure_schema;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let conn = memory_db();
        assert_eq!(insert_association(&conn, "/usr/bin/vim", "txt").unwrap(), 1);
        assert_eq!(insert_association(&conn, "/usr/bin/vim", "txt").unwrap(), 0);
        assert_eq!(count_associations(&conn).unwrap(), 1);
    }

    #[test]
    fn test_delete_unknown_path_is_ok() {
        let conn = memory_db();
        assert_eq!(delete_by_path(&conn, "/nowhere").unwrap(), 0);
    }

    #[test]
    fn test_lookup_is_exact_match() {
        let conn = memory_db();
        insert_association(&conn, "/usr/bin/vim", "txt").unwrap();
        insert_association(&conn, "/usr/bin/gedit", "TXT").unwrap();
        insert_association(&conn, "/usr/bin/less", ".txt").unwrap();

        assert_eq!(lookup_by_extension(&conn, "txt").unwrap(), vec!["/usr/bin/vim"]);
        assert_eq!(lookup_by_extension(&conn, "TXT").unwrap(), vec!["/usr/bin/gedit"]);
        assert!(lookup_by_extension(&conn, "md").unwrap().is_empty());
    }

    #[test]
    fn test_list_associations() {
        let conn = memory_db();
        insert_association(&conn, "/bin/a", "png").unwrap();
        insert_association(&conn, "/bin/a", "jpg").unwrap();
        let all = list_associations(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&Association {
            program_path: "/bin/a".to_string(),
            extension: "jpg".to_string(),
        }));
    }

    #[test]
    fn test_quotes_are_stored_literally() {
        let conn = memory_db();
        let hostile = "x'); DROP TABLE Programs;--";
        insert_association(&conn, hostile, "txt").unwrap();
        assert_eq!(lookup_by_extension(&conn, "txt").unwrap(), vec![hostile]);
    }
}
