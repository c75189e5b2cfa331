//! Catalog loading for ebook-shelf.
//!
//! This crate fetches the compressed catalog snapshot, unpacks and decodes
//! it, and bulk-loads the entries into the local store when the snapshot
//! has changed.

pub mod archive;
pub mod decode;
pub mod fetch;
pub mod loader;
pub mod location;
pub mod source;

pub use archive::unpack_catalog;
pub use decode::decode_catalog;
pub use fetch::{FetchClient, FetchConfig, FetchResponse};
pub use loader::{CatalogLoader, FINGERPRINT_KEY, LoadOutcome, LoaderConfig};
pub use location::{Location, LocationError};
pub use source::{CatalogSource, FileSource, HttpSource, source_from_config};
