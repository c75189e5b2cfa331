//! Typed collection handle and its write operations.
//!
//! A collection is a named partition of the `records` table. Records are
//! stored as JSON objects; the collection's declared key field names the
//! property bulk writes take their key from.

use std::fmt;
use std::marker::PhantomData;

use super::connection::Database;
use super::meta::{MetaEntry, write_meta};
use super::record::{Payload, RawRecord, StoredRecord, key_of, merge, name_of, to_object};
use crate::Error;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio_rusqlite::{params, rusqlite};

const UPSERT_ROW: &str = "INSERT INTO records (collection, key, name, body, timestamp, seq)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(collection, key) DO UPDATE SET
        name = excluded.name,
        body = excluded.body,
        timestamp = excluded.timestamp,
        seq = excluded.seq";

/// Handle to one named collection of `T` records.
pub struct Collection<T> {
    pub(crate) db: Database,
    pub(crate) name: String,
    key_field: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), name: self.name.clone(), key_field: self.key_field.clone(), _record: PhantomData }
    }
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("key_field", &self.key_field)
            .finish()
    }
}

/// A record ready to be written: key and name extracted, body encoded.
struct PendingRow {
    key: String,
    name: Option<String>,
    body: String,
}

enum UpsertOutcome {
    Updated,
    Inserted,
    Rejected(String),
}

/// Current time in milliseconds since the Unix epoch.
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Recency stamp for the next write: never older than the newest record,
/// with a sequence number strictly above every existing one.
fn next_stamp(conn: &rusqlite::Connection, collection: &str) -> rusqlite::Result<(i64, i64)> {
    let (last_ts, last_seq): (i64, i64) = conn.query_row(
        "SELECT COALESCE(MAX(timestamp), 0), COALESCE(MAX(seq), 0) FROM records WHERE collection = ?1",
        params![collection],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok((now_millis().max(last_ts), last_seq + 1))
}

/// The record's own key when its key field is set and differs from `key`.
fn conflicting_key(object: &Map<String, Value>, key_field: &str, key: &str) -> Option<String> {
    key_of(object, key_field).filter(|own| own != key)
}

fn write_row(
    conn: &rusqlite::Connection, collection: &str, row: &PendingRow, timestamp: i64, seq: i64,
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(UPSERT_ROW)?;
    stmt.execute(params![collection, row.key, row.name, row.body, timestamp, seq])?;
    Ok(())
}

fn write_rows(conn: &rusqlite::Connection, collection: &str, rows: &[PendingRow]) -> rusqlite::Result<()> {
    let (timestamp, first_seq) = next_stamp(conn, collection)?;
    for (offset, row) in rows.iter().enumerate() {
        write_row(conn, collection, row, timestamp, first_seq + offset as i64)?;
    }
    Ok(())
}

impl<T> Collection<T> {
    pub(crate) fn new(db: Database, name: String, key_field: String) -> Self {
        Self { db, name, key_field, _record: PhantomData }
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field bulk writes take each record's key from.
    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Database this collection lives in.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Insert or fully replace the record at `key`.
    ///
    /// Returns `Ok(false)` without writing when `value` is not a structured
    /// record (it does not serialize to a JSON object) or when its key field
    /// names a different key.
    pub async fn set_item(&self, key: &str, value: &T) -> Result<bool, Error> {
        let Some(object) = to_object(value)? else {
            tracing::error!(collection = %self.name, key, "set_item rejected: value is not a structured record");
            return Ok(false);
        };
        if let Some(own) = conflicting_key(&object, &self.key_field, key) {
            tracing::error!(collection = %self.name, key, %own, "set_item rejected: record key field names another key");
            return Ok(false);
        }

        let row = PendingRow { key: key.to_string(), name: name_of(&object), body: serde_json::to_string(&object)? };
        let collection = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let (timestamp, seq) = next_stamp(&tx, &collection)?;
                write_row(&tx, &collection, &row, timestamp, seq)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(true)
    }

    /// Get the record at `key`.
    ///
    /// Absence is a normal outcome, and so is any failure: storage and decode
    /// errors are logged and reported as `None`.
    pub async fn get_item(&self, key: &str) -> Option<StoredRecord<T>> {
        match self.try_get_item(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(collection = %self.name, key, error = %e, "get_item failed; reporting absent");
                None
            }
        }
    }

    async fn try_get_item(&self, key: &str) -> Result<Option<StoredRecord<T>>, Error> {
        let key = key.to_string();
        let collection = self.name.clone();
        let raw = self
            .db
            .conn
            .call(move |conn| -> Result<Option<RawRecord>, Error> {
                let result = conn.query_row(
                    "SELECT key, body, timestamp FROM records WHERE collection = ?1 AND key = ?2",
                    params![collection, key],
                    |row| Ok(RawRecord { key: row.get(0)?, body: row.get(1)?, timestamp: row.get(2)? }),
                );

                match result {
                    Ok(raw) => Ok(Some(raw)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        raw.map(RawRecord::decode).transpose()
    }

    /// Merge the fields of `patch` into the record at `key`, or insert
    /// `patch` as a new record when the key is absent.
    ///
    /// Returns `Ok(false)` without writing when `patch` is not a structured
    /// record, when it would change the record's key field, or when the
    /// merged result no longer decodes as `T`.
    pub async fn upsert_item<P>(&self, key: &str, patch: &P) -> Result<bool, Error>
    where
        P: Serialize + ?Sized,
    {
        let Some(patch) = to_object(patch)? else {
            tracing::error!(collection = %self.name, key, "upsert_item rejected: value is not a structured record");
            return Ok(false);
        };
        if let Some(own) = conflicting_key(&patch, &self.key_field, key) {
            tracing::error!(collection = %self.name, key, %own, "upsert_item rejected: patch changes the key field");
            return Ok(false);
        }

        let owned_key = key.to_string();
        let key_field = self.key_field.clone();
        let collection = self.name.clone();
        let outcome = self
            .db
            .conn
            .call(move |conn| -> Result<UpsertOutcome, Error> {
                let tx = conn.transaction()?;

                let existing = tx.query_row(
                    "SELECT body FROM records WHERE collection = ?1 AND key = ?2",
                    params![collection, owned_key],
                    |row| row.get::<_, String>(0),
                );
                let existing = match existing {
                    Ok(body) => Some(serde_json::from_str::<Map<String, Value>>(&body)?),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(e.into()),
                };
                let updated = existing.is_some();
                let merged = match existing {
                    Some(base) => merge(base, patch),
                    None => patch,
                };

                if let Some(own) = conflicting_key(&merged, &key_field, &owned_key) {
                    return Ok(UpsertOutcome::Rejected(format!("merged record is keyed `{own}`")));
                }
                if let Err(e) = serde_json::from_value::<T>(Value::Object(merged.clone())) {
                    return Ok(UpsertOutcome::Rejected(e.to_string()));
                }

                let row = PendingRow { key: owned_key, name: name_of(&merged), body: serde_json::to_string(&merged)? };
                let (timestamp, seq) = next_stamp(&tx, &collection)?;
                write_row(&tx, &collection, &row, timestamp, seq)?;
                tx.commit()?;

                Ok(if updated { UpsertOutcome::Updated } else { UpsertOutcome::Inserted })
            })
            .await
            .map_err(Error::from)?;

        match outcome {
            UpsertOutcome::Updated => {
                tracing::debug!(collection = %self.name, key, "upsert_item updated existing record");
                Ok(true)
            }
            UpsertOutcome::Inserted => {
                tracing::debug!(collection = %self.name, key, "upsert_item inserted new record");
                Ok(true)
            }
            UpsertOutcome::Rejected(reason) => {
                tracing::error!(collection = %self.name, key, %reason, "upsert_item rejected: merged record is invalid");
                Ok(false)
            }
        }
    }

    /// Bulk write.
    ///
    /// [`Payload::Many`] upserts every record under the value of its key
    /// field, all in one transaction. [`Payload::One`] inserts a single new
    /// record and fails with [`Error::DuplicateKey`] if its key is taken.
    /// Returns the number of records written.
    pub async fn put_all(&self, payload: impl Into<Payload<T>>) -> Result<usize, Error> {
        match payload.into() {
            Payload::Many(values) => {
                let rows = self.pending_rows(&values)?;
                let written = rows.len();
                let collection = self.name.clone();
                self.db
                    .conn
                    .call(move |conn| -> Result<(), Error> {
                        let tx = conn.transaction()?;
                        write_rows(&tx, &collection, &rows)?;
                        tx.commit()?;
                        Ok(())
                    })
                    .await
                    .map_err(Error::from)?;

                tracing::debug!(collection = %self.name, written, "put_all wrote records");
                Ok(written)
            }
            Payload::One(value) => {
                let row = self
                    .pending_rows(std::slice::from_ref(&value))?
                    .pop()
                    .ok_or_else(|| Error::InvalidRecord("empty record".into()))?;
                let collection = self.name.clone();
                self.db
                    .conn
                    .call(move |conn| -> Result<(), Error> {
                        let tx = conn.transaction()?;
                        let taken: bool = tx.query_row(
                            "SELECT EXISTS(SELECT 1 FROM records WHERE collection = ?1 AND key = ?2)",
                            params![collection, row.key],
                            |r| r.get(0),
                        )?;
                        if taken {
                            return Err(Error::DuplicateKey(row.key));
                        }
                        let (timestamp, seq) = next_stamp(&tx, &collection)?;
                        write_row(&tx, &collection, &row, timestamp, seq)?;
                        tx.commit()?;
                        Ok(())
                    })
                    .await
                    .map_err(Error::from)?;
                Ok(1)
            }
        }
    }

    /// Replace the whole collection with `values` in one transaction,
    /// optionally writing a meta entry in the same transaction.
    ///
    /// Readers observe either the previous contents or the new ones.
    pub async fn replace_all(&self, values: &[T], meta: Option<MetaEntry>) -> Result<usize, Error> {
        let rows = self.pending_rows(values)?;
        let written = rows.len();
        let collection = self.name.clone();
        let removed = self
            .db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                let removed = tx.execute("DELETE FROM records WHERE collection = ?1", params![collection])?;
                write_rows(&tx, &collection, &rows)?;
                if let Some(entry) = meta {
                    write_meta(&tx, &entry)?;
                }
                tx.commit()?;
                Ok(removed)
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(collection = %self.name, removed, written, "replaced collection contents");
        Ok(written)
    }

    fn pending_rows(&self, values: &[T]) -> Result<Vec<PendingRow>, Error> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let object = to_object(value)?
                    .ok_or_else(|| Error::InvalidRecord(format!("record {index} is not a structured record")))?;
                let key = key_of(&object, &self.key_field)
                    .ok_or_else(|| Error::MissingKey { index, field: self.key_field.clone() })?;
                Ok(PendingRow { key, name: name_of(&object), body: serde_json::to_string(&object)? })
            })
            .collect()
    }
}

impl<T> Collection<T> {
    /// Number of records in the collection.
    pub async fn count(&self) -> Result<u64, Error> {
        let collection = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM records WHERE collection = ?1", params![collection], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the record with key `key`.
    ///
    /// Returns the number of deleted records; zero is not an error.
    pub async fn delete_by_key(&self, key: &str) -> Result<u64, Error> {
        let key = key.to_string();
        let collection = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count =
                    conn.execute("DELETE FROM records WHERE collection = ?1 AND key = ?2", params![collection, key])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Drop every record of the collection.
    ///
    /// Returns the number of deleted records.
    pub async fn clear(&self) -> Result<u64, Error> {
        let collection = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM records WHERE collection = ?1", params![collection])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
