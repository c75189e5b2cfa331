//! Store database handle.
//!
//! One SQLite file holds every collection plus the meta table. The file runs
//! in WAL mode so readers are not blocked by the loader's bulk writes.

use super::collection::Collection;
use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA busy_timeout=5000;
     PRAGMA temp_store=MEMORY;";

/// Shared handle to the store database.
///
/// Statements run on the tokio-rusqlite connection thread; clones share it.
#[derive(Clone, Debug)]
pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    /// Open (or create) the database file at `path` and migrate it.
    ///
    /// Missing parent directories are created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::InvalidInput(format!("cannot create {}: {e}", parent.display())))?;
        }
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        tracing::debug!(path = %path.display(), "opened store database");
        Self::prepare(conn).await
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }

    /// Handle to one named collection whose records are keyed by `key_field`.
    pub fn collection<T>(&self, name: impl Into<String>, key_field: impl Into<String>) -> Collection<T> {
        Collection::new(self.clone(), name.into(), key_field.into())
    }

    /// Close the underlying connection, flushing pending work.
    pub async fn close(self) -> Result<(), Error> {
        self.conn.close().await.map_err(Error::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = Database::open_in_memory().await.unwrap();
        let version = db
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
    }

    #[tokio::test]
    async fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("shelf.sqlite");

        Database::open(&path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_open_file_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.sqlite");

        let db = Database::open(&path).await.unwrap();
        db.set_meta("probe", "1").await.unwrap();
        db.close().await.unwrap();

        let reopened = Database::open(&path).await.unwrap();
        assert_eq!(reopened.get_meta("probe").await.unwrap().as_deref(), Some("1"));
    }
}
