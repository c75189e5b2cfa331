//! Snapshot sources.
//!
//! The loader only needs the raw snapshot bytes; where they come from is
//! behind the [`CatalogSource`] trait so the network path and the local-file
//! path share one ingest sequence.

use std::path::PathBuf;

use bytes::Bytes;
use url::Url;

use crate::fetch::{FetchClient, FetchConfig};
use crate::location::Location;
use shelf_core::{AppConfig, Error};

/// Provider of compressed catalog snapshots.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Read the whole snapshot.
    async fn fetch_snapshot(&self) -> Result<Bytes, Error>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Snapshot served over HTTP(S).
pub struct HttpSource {
    client: FetchClient,
    url: Url,
}

impl HttpSource {
    pub fn new(url: Url, config: FetchConfig) -> Result<Self, Error> {
        Ok(Self { client: FetchClient::new(config)?, url })
    }
}

#[async_trait::async_trait]
impl CatalogSource for HttpSource {
    async fn fetch_snapshot(&self) -> Result<Bytes, Error> {
        let response = self.client.fetch(&self.url).await?;
        if response.final_url != response.url {
            tracing::debug!(from = %response.url, to = %response.final_url, "snapshot redirected");
        }
        Ok(response.bytes)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Snapshot read from the local filesystem.
pub struct FileSource {
    path: PathBuf,
    max_bytes: usize,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self { path: path.into(), max_bytes }
    }
}

#[async_trait::async_trait]
impl CatalogSource for FileSource {
    async fn fetch_snapshot(&self) -> Result<Bytes, Error> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| Error::SourceUnavailable(format!("{}: {e}", self.path.display())))?;

        if metadata.len() > self.max_bytes as u64 {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", metadata.len(), self.max_bytes)));
        }

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::SourceUnavailable(format!("{}: {e}", self.path.display())))?;

        tracing::debug!("read {} ({} bytes)", self.path.display(), bytes.len());

        Ok(Bytes::from(bytes))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Build the source for the configured catalog location.
pub fn source_from_config(config: &AppConfig) -> Result<Box<dyn CatalogSource>, Error> {
    let location = Location::parse(&config.catalog_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let source: Box<dyn CatalogSource> = match location {
        Location::Remote(url) => Box::new(HttpSource::new(url, FetchConfig::from(config))?),
        Location::Local(path) => Box::new(FileSource::new(path, config.max_bytes)),
    };

    Ok(source)
}
