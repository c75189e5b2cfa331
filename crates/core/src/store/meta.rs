//! Process-wide persisted values.
//!
//! A small string key/value table that survives restarts, used for state
//! such as the fingerprint of the last ingested catalog snapshot.

use super::connection::Database;
use crate::Error;
use tokio_rusqlite::{params, rusqlite};

/// One meta value to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    pub key: String,
    pub value: String,
}

impl MetaEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

pub(crate) fn write_meta(conn: &rusqlite::Connection, entry: &MetaEntry) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO meta (key, value, updated_at) VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at",
        params![entry.key, entry.value, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

impl Database {
    /// Get a meta value.
    ///
    /// Returns None if the key has never been written.
    pub async fn get_meta(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| row.get(0));

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a meta value.
    pub async fn set_meta(&self, key: &str, value: &str) -> Result<(), Error> {
        let entry = MetaEntry::new(key, value);
        self.conn
            .call(move |conn| -> Result<(), Error> {
                write_meta(conn, &entry)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_meta() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(db.get_meta("catalog.snapshot_size").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_meta_overwrites() {
        let db = Database::open_in_memory().await.unwrap();
        db.set_meta("catalog.snapshot_size", "100").await.unwrap();
        db.set_meta("catalog.snapshot_size", "200").await.unwrap();

        assert_eq!(db.get_meta("catalog.snapshot_size").await.unwrap().as_deref(), Some("200"));
    }
}
