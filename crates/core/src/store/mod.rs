//! SQLite-backed local store for cached catalog records.
//!
//! This module provides persistent, ordered key/value collections using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Typed collections over JSON-object records with a declared key field
//! - Recency ordering through store-managed timestamps
//! - Pagination, following-record scans and name search
//! - Atomic replacement of a collection's contents
//! - Automatic schema migrations and WAL mode

pub mod collection;
pub mod connection;
pub mod meta;
pub mod migrations;
pub mod query;
pub mod record;

pub use collection::Collection;
pub use connection::Database;
pub use meta::MetaEntry;
pub use record::{Payload, StoredRecord};
