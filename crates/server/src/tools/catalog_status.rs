//! catalog_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_client::FINGERPRINT_KEY;
use shelf_core::{CatalogEntry, Collection};

use super::json_result;

/// Output structure for catalog_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogStatusOutput {
    pub collection: String,
    pub records: u64,
    /// Byte length of the last ingested snapshot, if one was ingested.
    pub snapshot_size: Option<u64>,
}

/// Implementation of the catalog_status tool.
pub async fn status_impl(catalog: &Collection<CatalogEntry>) -> Result<CallToolResult, McpError> {
    let records = catalog.count().await?;
    let snapshot_size = catalog
        .database()
        .get_meta(FINGERPRINT_KEY)
        .await?
        .and_then(|raw| raw.parse().ok());

    json_result(&CatalogStatusOutput { collection: catalog.name().to_string(), records, snapshot_size })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{catalog, entry, text};

    #[tokio::test]
    async fn test_status_empty_store() {
        let catalog = catalog(&[]).await;

        let output: CatalogStatusOutput = serde_json::from_str(&text(&status_impl(&catalog).await.unwrap())).unwrap();
        assert_eq!(output.collection, "book-list");
        assert_eq!(output.records, 0);
        assert_eq!(output.snapshot_size, None);
    }

    #[tokio::test]
    async fn test_status_reports_fingerprint() {
        let catalog = catalog(&[entry("a", "Alpha", 1), entry("b", "Beta", 1)]).await;
        catalog.database().set_meta(FINGERPRINT_KEY, "4096").await.unwrap();

        let output: CatalogStatusOutput = serde_json::from_str(&text(&status_impl(&catalog).await.unwrap())).unwrap();
        assert_eq!(output.records, 2);
        assert_eq!(output.snapshot_size, Some(4096));
    }
}
