//! Catalog ingest sequencing.
//!
//! On each run the loader fetches the snapshot and compares its byte length
//! with the fingerprint persisted by the previous ingest. A different length,
//! or an empty store, triggers a full re-ingest; otherwise the cached records
//! are kept. Equal-length snapshots with different contents are treated as
//! unchanged.
//!
//! The re-ingest replaces the collection and records the new fingerprint in
//! one transaction, so readers never see a half-loaded catalog and a failed
//! ingest leaves the previous state intact.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::archive::unpack_catalog;
use crate::decode::decode_catalog;
use crate::source::CatalogSource;
use shelf_core::{AppConfig, CatalogEntry, Collection, Error, MetaEntry};

/// Meta key holding the byte length of the last ingested snapshot.
pub const FINGERPRINT_KEY: &str = "catalog.snapshot_size";

/// Result of one loader run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Snapshot unchanged and store populated; nothing written.
    Skipped { records: u64, fingerprint: u64 },
    /// Store repopulated from the snapshot.
    Ingested { records: u64, fingerprint: u64, previous_fingerprint: Option<u64> },
}

/// Loader tuning taken from the application config.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Entry looked up when the archive holds several files.
    pub entry_name: String,
    /// Bound on the decompressed catalog entry.
    pub max_entry_bytes: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { entry_name: "ebook-list.json".to_string(), max_entry_bytes: 256 * 1024 * 1024 }
    }
}

impl From<&AppConfig> for LoaderConfig {
    fn from(config: &AppConfig) -> Self {
        Self { entry_name: config.catalog_entry.clone(), max_entry_bytes: config.max_entry_bytes }
    }
}

/// Populates a catalog collection from snapshots.
#[derive(Clone)]
pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
    catalog: Collection<CatalogEntry>,
    config: LoaderConfig,
    ingest_lock: Arc<Mutex<()>>,
}

impl CatalogLoader {
    pub fn new(source: Box<dyn CatalogSource>, catalog: Collection<CatalogEntry>, config: LoaderConfig) -> Self {
        Self { source: Arc::from(source), catalog, config, ingest_lock: Arc::new(Mutex::new(())) }
    }

    /// Fingerprint recorded by the last successful ingest, if any.
    pub async fn stored_fingerprint(&self) -> Result<Option<u64>, Error> {
        let stored = self.catalog.database().get_meta(FINGERPRINT_KEY).await?;
        Ok(stored.and_then(|raw| match raw.parse::<u64>() {
            Ok(size) => Some(size),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring unreadable snapshot fingerprint");
                None
            }
        }))
    }

    /// Run the ingest sequence once.
    ///
    /// Concurrent calls are serialized; a call that waited behind an ingest
    /// sees the fresh fingerprint and skips.
    pub async fn load(&self) -> Result<LoadOutcome, Error> {
        let _guard = self.ingest_lock.lock().await;

        let snapshot = self.source.fetch_snapshot().await?;
        let fingerprint = snapshot.len() as u64;
        let previous = self.stored_fingerprint().await?;
        let records = self.catalog.count().await?;

        if previous == Some(fingerprint) && records > 0 {
            tracing::debug!(
                source = %self.source.describe(),
                fingerprint,
                records,
                "catalog snapshot unchanged; keeping cached records"
            );
            return Ok(LoadOutcome::Skipped { records, fingerprint });
        }

        tracing::info!(
            source = %self.source.describe(),
            fingerprint,
            previous_fingerprint = ?previous,
            cached_records = records,
            "ingesting catalog snapshot"
        );

        let json = unpack_catalog(&snapshot, &self.config.entry_name, self.config.max_entry_bytes)?;
        let entries = decode_catalog(&json)?;
        let written = self
            .catalog
            .replace_all(&entries, Some(MetaEntry::new(FINGERPRINT_KEY, fingerprint.to_string())))
            .await?;

        Ok(LoadOutcome::Ingested { records: written as u64, fingerprint, previous_fingerprint: previous })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::zip_snapshot;
    use bytes::Bytes;
    use shelf_core::{CATALOG_KEY_FIELD, Database};
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source serving whatever snapshot the test last installed.
    #[derive(Clone, Default)]
    struct StaticSource {
        snapshot: Arc<StdMutex<Option<Bytes>>>,
        fetches: Arc<AtomicUsize>,
    }

    impl StaticSource {
        fn set(&self, bytes: Vec<u8>) {
            *self.snapshot.lock().unwrap() = Some(Bytes::from(bytes));
        }
    }

    #[async_trait::async_trait]
    impl CatalogSource for StaticSource {
        async fn fetch_snapshot(&self) -> Result<Bytes, Error> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.snapshot
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| Error::SourceUnavailable("no snapshot installed".into()))
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    fn catalog_json(entries: &[(&str, &str, u64)]) -> Vec<u8> {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|(id, name, size)| serde_json::json!({"id": id, "name": name, "size": size.to_string()}))
            .collect();
        serde_json::to_vec(&items).unwrap()
    }

    fn snapshot(entries: &[(&str, &str, u64)]) -> Vec<u8> {
        zip_snapshot(&[("ebook-list.json", &catalog_json(entries))])
    }

    async fn setup() -> (StaticSource, CatalogLoader, Collection<CatalogEntry>) {
        let db = Database::open_in_memory().await.unwrap();
        let catalog: Collection<CatalogEntry> = db.collection("book-list", CATALOG_KEY_FIELD);
        let source = StaticSource::default();
        let loader = CatalogLoader::new(Box::new(source.clone()), catalog.clone(), LoaderConfig::default());
        (source, loader, catalog)
    }

    #[tokio::test]
    async fn test_first_load_ingests() {
        let (source, loader, catalog) = setup().await;
        let bytes = snapshot(&[("a", "Alpha", 10), ("b", "Beta", 20)]);
        let size = bytes.len() as u64;
        source.set(bytes);

        let outcome = loader.load().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Ingested { records: 2, fingerprint: size, previous_fingerprint: None });
        assert_eq!(catalog.count().await.unwrap(), 2);
        assert_eq!(loader.stored_fingerprint().await.unwrap(), Some(size));
        assert_eq!(catalog.search("alp").await.unwrap()[0].value.id, "a");
    }

    #[tokio::test]
    async fn test_unchanged_snapshot_skips() {
        let (source, loader, catalog) = setup().await;
        source.set(snapshot(&[("a", "Alpha", 10)]));
        loader.load().await.unwrap();

        catalog.upsert_item("a", &serde_json::json!({"name": "Alpha (local edit)"})).await.unwrap();

        let outcome = loader.load().await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Skipped { records: 1, .. }));
        assert_eq!(catalog.get_item("a").await.unwrap().value.name, "Alpha (local edit)");
    }

    #[tokio::test]
    async fn test_size_change_reingests() {
        let (source, loader, catalog) = setup().await;
        source.set(snapshot(&[("a", "Alpha", 10), ("b", "Beta", 20)]));
        loader.load().await.unwrap();

        source.set(snapshot(&[("c", "Gamma with a much longer title", 30)]));
        let outcome = loader.load().await.unwrap();

        assert!(matches!(outcome, LoadOutcome::Ingested { records: 1, previous_fingerprint: Some(_), .. }));
        assert_eq!(catalog.count().await.unwrap(), 1);
        assert!(catalog.get_item("a").await.is_none());
        assert!(catalog.get_item("c").await.is_some());
    }

    #[tokio::test]
    async fn test_empty_store_reingests_despite_matching_fingerprint() {
        let (source, loader, catalog) = setup().await;
        source.set(snapshot(&[("a", "Alpha", 10)]));
        loader.load().await.unwrap();

        catalog.clear().await.unwrap();

        let outcome = loader.load().await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Ingested { records: 1, .. }));
        assert_eq!(catalog.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_broken_snapshot_keeps_previous_state() {
        let (source, loader, catalog) = setup().await;
        let good = snapshot(&[("a", "Alpha", 10)]);
        let good_size = good.len() as u64;
        source.set(good);
        loader.load().await.unwrap();

        source.set(b"definitely not a zip archive".to_vec());
        let err = loader.load().await.unwrap_err();

        assert!(matches!(err, Error::Archive(_)));
        assert_eq!(catalog.count().await.unwrap(), 1);
        assert_eq!(loader.stored_fingerprint().await.unwrap(), Some(good_size));
    }

    #[tokio::test]
    async fn test_malformed_entry_aborts_ingest() {
        let (source, loader, catalog) = setup().await;
        let json = br#"[{"id": "a", "name": "Alpha", "size": 1}, {"name": "missing id", "size": 2}]"#;
        source.set(zip_snapshot(&[("ebook-list.json", json)]));

        let err = loader.load().await.unwrap_err();

        assert!(matches!(err, Error::CatalogDecode(ref msg) if msg.contains("entry 1")));
        assert_eq!(catalog.count().await.unwrap(), 0);
        assert_eq!(loader.stored_fingerprint().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces() {
        let (_source, loader, _catalog) = setup().await;
        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_concurrent_loads_ingest_once() {
        let (source, loader, catalog) = setup().await;
        source.set(snapshot(&[("a", "Alpha", 10), ("b", "Beta", 20)]));

        let (first, second) = tokio::join!(loader.load(), loader.load());
        let outcomes = [first.unwrap(), second.unwrap()];

        let ingests = outcomes.iter().filter(|o| matches!(o, LoadOutcome::Ingested { .. })).count();
        assert_eq!(ingests, 1);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(catalog.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_fingerprint_is_ignored() {
        let (source, loader, catalog) = setup().await;
        catalog.database().set_meta(FINGERPRINT_KEY, "not-a-number").await.unwrap();
        source.set(snapshot(&[("a", "Alpha", 10)]));

        assert_eq!(loader.stored_fingerprint().await.unwrap(), None);
        assert!(matches!(loader.load().await.unwrap(), LoadOutcome::Ingested { previous_fingerprint: None, .. }));
    }

    #[test]
    fn test_loader_config_from_app_config() {
        let app = AppConfig { catalog_entry: "books.json".into(), max_entry_bytes: 4096, ..Default::default() };
        let config = LoaderConfig::from(&app);
        assert_eq!(config.entry_name, "books.json");
        assert_eq!(config.max_entry_bytes, 4096);
    }
}
