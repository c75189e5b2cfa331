//! catalog_search tool implementation.
//!
//! Case-insensitive substring search over catalog entry names.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_core::{CatalogEntry, Collection, Error};

use super::{CatalogItem, json_result};

/// Input parameters for catalog_search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogSearchParams {
    /// Text to look for in entry names. Matched literally, ignoring case.
    pub keyword: String,
}

/// Output structure for catalog_search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogSearchOutput {
    /// The trimmed keyword that was searched for.
    pub keyword: String,
    pub total: usize,
    /// Matches ordered by name.
    pub items: Vec<CatalogItem>,
}

/// Implementation of the catalog_search tool.
pub async fn search_impl(
    catalog: &Collection<CatalogEntry>, params: CatalogSearchParams,
) -> Result<CallToolResult, McpError> {
    let keyword = params.keyword.trim();
    if keyword.is_empty() {
        return Err(Error::InvalidInput("keyword cannot be empty".into()).into());
    }

    let items: Vec<CatalogItem> = catalog.search(keyword).await?.into_iter().map(CatalogItem::from).collect();

    tracing::debug!(keyword, matches = items.len(), "catalog search");

    json_result(&CatalogSearchOutput { keyword: keyword.to_string(), total: items.len(), items })
}
