//! Core types and shared functionality for ebook-shelf.
//!
//! This crate provides:
//! - Local store implementation with SQLite backend
//! - Catalog entry model
//! - Unified error types
//! - Configuration structures

pub mod catalog;
pub mod config;
pub mod error;
pub mod store;

pub use catalog::{CATALOG_KEY_FIELD, CatalogEntry};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use store::{Collection, Database, MetaEntry, Payload, StoredRecord};
