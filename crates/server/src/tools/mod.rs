//! MCP tool implementations.
//!
//! This module contains all tools exposed by the shelf-mcp server.

pub mod catalog_get;
pub mod catalog_recent;
pub mod catalog_search;
pub mod catalog_status;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_core::{CatalogEntry, Error, StoredRecord};

pub use catalog_get::{CatalogGetParams, get_impl};
pub use catalog_recent::{CatalogRecentParams, recent_impl};
pub use catalog_search::{CatalogSearchParams, search_impl};
pub use catalog_status::status_impl;

/// One catalog entry as presented to MCP clients.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub file_extension: String,
    /// Size in bytes.
    pub size: u64,
    /// Size in mebibytes with two decimals, e.g. "8.11 MB".
    pub size_mb: String,
    pub web_view_link: Option<String>,
    pub web_content_link: Option<String>,
    /// When the store last wrote this entry (ms since the Unix epoch).
    pub stored_at: i64,
}

impl From<StoredRecord<CatalogEntry>> for CatalogItem {
    fn from(record: StoredRecord<CatalogEntry>) -> Self {
        let size_mb = record.value.display_size();
        let entry = record.value;
        Self {
            id: entry.id,
            name: entry.name,
            file_extension: entry.file_extension,
            size: entry.size,
            size_mb,
            web_view_link: entry.web_view_link,
            web_content_link: entry.web_content_link,
            stored_at: record.timestamp,
        }
    }
}

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::Serialization(format!("tool output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod testing {
    use shelf_core::{CATALOG_KEY_FIELD, CatalogEntry, Collection, Database};

    pub fn entry(id: &str, name: &str, size: u64) -> CatalogEntry {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "fileExtension": "epub",
            "size": size,
            "webViewLink": format!("https://drive.example.com/view/{id}"),
        }))
        .unwrap()
    }

    /// In-memory catalog holding `entries`, stored in order.
    pub async fn catalog(entries: &[CatalogEntry]) -> Collection<CatalogEntry> {
        let db = Database::open_in_memory().await.unwrap();
        let catalog = db.collection("book-list", CATALOG_KEY_FIELD);
        catalog.replace_all(entries, None).await.unwrap();
        catalog
    }

    /// Text of the first content block of a tool result.
    pub fn text(result: &rmcp::model::CallToolResult) -> String {
        result.content[0].as_text().unwrap().text.clone()
    }
}
