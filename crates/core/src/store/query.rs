//! Ordered, paginated and keyword reads over a collection.
//!
//! Recency order is `(timestamp, seq)`: newest first for the descending
//! reads, insertion order for [`Collection::get_all`].

use super::collection::Collection;
use super::record::{RawRecord, StoredRecord, decode_all};
use crate::Error;
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use tokio_rusqlite::{params, rusqlite};

/// SQLite bound for a row count; counts beyond `i64::MAX` saturate.
fn sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord { key: row.get(0)?, body: row.get(1)?, timestamp: row.get(2)? })
}

impl<T> Collection<T>
where
    T: DeserializeOwned,
{
    /// Up to `limit` records, most recently touched first, skipping `offset`.
    pub async fn get_last_many(&self, limit: usize, offset: usize) -> Result<Vec<StoredRecord<T>>, Error> {
        let collection = self.name.clone();
        let rows = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<RawRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, body, timestamp FROM records
                    WHERE collection = ?1
                    ORDER BY timestamp DESC, seq DESC
                    LIMIT ?2 OFFSET ?3",
                )?;
                let rows = stmt
                    .query_map(params![collection, sql_count(limit), sql_count(offset)], raw_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        decode_all(rows)
    }

    /// Up to `limit` records that follow `reference_key` in newest-first order.
    ///
    /// With `include_reference` the reference record comes first, ahead of
    /// the `limit` followers. An unknown reference yields an empty list.
    pub async fn get_following_many(
        &self, reference_key: &str, limit: usize, include_reference: bool,
    ) -> Result<Vec<StoredRecord<T>>, Error> {
        let reference_key = reference_key.to_string();
        let collection = self.name.clone();
        let rows = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<RawRecord>, Error> {
                let reference = conn.query_row(
                    "SELECT key, body, timestamp, seq FROM records WHERE collection = ?1 AND key = ?2",
                    params![collection, reference_key],
                    |row| Ok((raw_row(row)?, row.get::<_, i64>(3)?)),
                );
                let (reference, reference_seq) = match reference {
                    Ok(found) => found,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(Vec::new()),
                    Err(e) => return Err(e.into()),
                };

                let mut stmt = conn.prepare(
                    "SELECT key, body, timestamp FROM records
                    WHERE collection = ?1
                      AND (timestamp < ?2 OR (timestamp = ?2 AND seq < ?3))
                    ORDER BY timestamp DESC, seq DESC
                    LIMIT ?4",
                )?;
                let followers = stmt
                    .query_map(params![collection, reference.timestamp, reference_seq, sql_count(limit)], raw_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                let mut rows = Vec::with_capacity(followers.len() + 1);
                if include_reference {
                    rows.push(reference);
                }
                rows.extend(followers);
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        decode_all(rows)
    }

    /// Every record, oldest first.
    pub async fn get_all(&self) -> Result<Vec<StoredRecord<T>>, Error> {
        let collection = self.name.clone();
        let rows = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<RawRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, body, timestamp FROM records
                    WHERE collection = ?1
                    ORDER BY timestamp ASC, seq ASC",
                )?;
                let rows = stmt
                    .query_map(params![collection], raw_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        decode_all(rows)
    }

    /// Records whose `name` contains `keyword`, ignoring case, ordered by name.
    ///
    /// The keyword is matched literally. An empty keyword matches every
    /// record that has a name; records without one are never returned.
    pub async fn search(&self, keyword: &str) -> Result<Vec<StoredRecord<T>>, Error> {
        let pattern = RegexBuilder::new(&regex::escape(keyword))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::InvalidInput(format!("unusable keyword: {e}")))?;

        let collection = self.name.clone();
        let rows = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<RawRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, body, timestamp, name FROM records
                    WHERE collection = ?1 AND name IS NOT NULL
                    ORDER BY name ASC, key ASC",
                )?;
                let mut rows = stmt.query(params![collection])?;

                let mut matches = Vec::new();
                while let Some(row) = rows.next()? {
                    let name: String = row.get(3)?;
                    if pattern.is_match(&name) {
                        matches.push(raw_row(row)?);
                    }
                }
                Ok(matches)
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(collection = %self.name, keyword, matches = rows.len(), "search");
        decode_all(rows)
    }
}

impl<T> Collection<T> {
    /// Every key, most recently touched first.
    pub async fn primary_keys(&self) -> Result<Vec<String>, Error> {
        let collection = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key FROM records
                    WHERE collection = ?1
                    ORDER BY timestamp DESC, seq DESC",
                )?;
                let keys = stmt
                    .query_map(params![collection], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
