//! Persistent store for the registry.
//!
//! `Store` keeps only the database path. Each operation opens its own
//! connection, runs the schema check, and drops the connection on return,
//! so a failed call leaves nothing behind for the next one.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial implementation

use std::path::{Path, PathBuf};

use tracing::debug;

use super::connection::open_store;
use super::helpers::{self, Association};
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Create the table if absent.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        open_store(&self.db_path).map(drop)
    }

    /// Add an association. Re-adding an existing pair succeeds.
    pub fn insert(&self, path: &str, extension: &str) -> Result<(), StoreError> {
        let conn = open_store(&self.db_path)?;
        let changed = helpers::insert_association(&conn, path, extension)?;
        debug!(path, extension, changed, "insert");
        Ok(())
    }

    /// Remove every association for `path`.
    pub fn delete_by_path(&self, path: &str) -> Result<(), StoreError> {
        let conn = open_store(&self.db_path)?;
        let removed = helpers::delete_by_path(&conn, path)?;
        debug!(path, removed, "delete");
        Ok(())
    }

    /// Program paths registered for exactly `extension`.
    pub fn lookup_by_extension(&self, extension: &str) -> Result<Vec<String>, StoreError> {
        let conn = open_store(&self.db_path)?;
        let paths = helpers::lookup_by_extension(&conn, extension)?;
        debug!(extension, found = paths.len(), "lookup");
        Ok(paths)
    }

    pub fn associations(&self) -> Result<Vec<Association>, StoreError> {
        let conn = open_store(&self.db_path)?;
        helpers::list_associations(&conn)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = open_store(&self.db_path)?;
        helpers::count_associations(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("extensions.db"));
        (dir, store)
    }

    #[test]
    fn test_persists_across_instances() {
        let (dir, store) = temp_store();
        store.insert("/usr/bin/feh", "png").unwrap();

        let reopened = Store::new(dir.path().join("extensions.db"));
        assert_eq!(reopened.lookup_by_extension("png").unwrap(), vec!["/usr/bin/feh"]);
    }

    #[test]
    fn test_lookup_before_any_insert() {
        let (_dir, store) = temp_store();
        assert!(store.lookup_by_extension("png").unwrap().is_empty());
    }

    #[test]
    fn test_delete_removes_all_extensions_for_path() {
        let (_dir, store) = temp_store();
        store.insert("/bin/p", "e1").unwrap();
        store.insert("/bin/p", "e2").unwrap();
        store.insert("/bin/q", "e1").unwrap();

        store.delete_by_path("/bin/p").unwrap();

        assert_eq!(store.lookup_by_extension("e1").unwrap(), vec!["/bin/q"]);
        assert!(store.lookup_by_extension("e2").unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_unopenable_location() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("absent").join("extensions.db"));
        assert!(matches!(
            store.insert("/bin/a", "txt"),
            Err(StoreError::ConnectionFailed { .. })
        ));
    }
}
