//! catalog_get tool implementation.
//!
//! Retrieves one catalog entry by id.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_core::{CatalogEntry, Collection, Error};

use super::{CatalogItem, json_result};

/// Parameters for the catalog_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogGetParams {
    /// The catalog entry id.
    pub id: String,
}

/// Implementation of the catalog_get tool.
pub async fn get_impl(catalog: &Collection<CatalogEntry>, params: CatalogGetParams) -> Result<CallToolResult, McpError> {
    let record = catalog
        .get_item(&params.id)
        .await
        .ok_or_else(|| Error::NotFound(format!("no catalog entry with id `{}`", params.id)))?;

    json_result(&CatalogItem::from(record))
}
