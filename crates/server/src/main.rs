//! shelf-mcp server entry point.
//!
//! Boots the MCP server on stdio transport after starting the catalog loader
//! in the background. Logging goes to stderr to avoid interfering with the
//! JSON-RPC protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shelf_client::{CatalogLoader, LoadOutcome, LoaderConfig, source_from_config};
use shelf_core::{AppConfig, CATALOG_KEY_FIELD, CatalogEntry, Collection, Database};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

/// Start the loader once; failures are logged and the server keeps serving
/// whatever the store already holds.
fn spawn_loader(config: &AppConfig, catalog: Collection<CatalogEntry>) {
    let source = match source_from_config(config) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, catalog_url = %config.catalog_url, "catalog source unusable; serving cached records");
            return;
        }
    };

    let loader = CatalogLoader::new(source, catalog, LoaderConfig::from(config));

    tokio::spawn(async move {
        match loader.load().await {
            Ok(LoadOutcome::Skipped { records, fingerprint }) => {
                tracing::info!(records, fingerprint, "catalog up to date");
            }
            Ok(LoadOutcome::Ingested { records, fingerprint, previous_fingerprint }) => {
                tracing::info!(records, fingerprint, ?previous_fingerprint, "catalog ingested");
            }
            Err(e) => tracing::error!(error = %e, "catalog load failed; serving cached records"),
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    tracing::info!(
        db_path = %config.db_path.display(),
        catalog_url = %config.catalog_url,
        remote = config.catalog_is_remote(),
        collection = %config.collection,
        "Starting shelf-mcp server on stdio transport"
    );

    let db = Database::open(&config.db_path).await?;
    let catalog: Collection<CatalogEntry> = db.collection(config.collection.clone(), CATALOG_KEY_FIELD);

    spawn_loader(&config, catalog.clone());

    let handler = handler::ShelfServer::new(catalog);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
