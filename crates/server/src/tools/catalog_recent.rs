//! catalog_recent tool implementation.
//!
//! Lists the most recently stored catalog entries, newest first.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_core::{CatalogEntry, Collection, Error};

use super::{CatalogItem, json_result};

const MAX_LIMIT: usize = 100;

/// Parameters for the catalog_recent tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogRecentParams {
    /// Number of entries to return (1-100).
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Number of newest entries to skip.
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    10
}

/// Output structure for catalog_recent tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogRecentOutput {
    pub offset: usize,
    pub items: Vec<CatalogItem>,
}

/// Implementation of the catalog_recent tool.
pub async fn recent_impl(
    catalog: &Collection<CatalogEntry>, params: CatalogRecentParams,
) -> Result<CallToolResult, McpError> {
    if params.limit == 0 || params.limit > MAX_LIMIT {
        return Err(Error::InvalidInput(format!("limit must be between 1 and {MAX_LIMIT}")).into());
    }

    let items = catalog
        .get_last_many(params.limit, params.offset)
        .await?
        .into_iter()
        .map(CatalogItem::from)
        .collect();

    json_result(&CatalogRecentOutput { offset: params.offset, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{catalog, entry, text};

    fn ids(result: &CallToolResult) -> Vec<String> {
        let output: CatalogRecentOutput = serde_json::from_str(&text(result)).unwrap();
        output.items.into_iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_params_defaults() {
        let params: CatalogRecentParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.limit, 10);
        assert_eq!(params.offset, 0);
    }

    #[tokio::test]
    async fn test_recent_newest_first() {
        let catalog = catalog(&[entry("a", "Alpha", 1), entry("b", "Beta", 1), entry("c", "Gamma", 1)]).await;

        let result = recent_impl(&catalog, CatalogRecentParams { limit: 2, offset: 0 }).await.unwrap();
        assert_eq!(ids(&result), ["c", "b"]);

        let result = recent_impl(&catalog, CatalogRecentParams { limit: 10, offset: 2 }).await.unwrap();
        assert_eq!(ids(&result), ["a"]);
    }

    #[tokio::test]
    async fn test_recent_offset_past_end_is_empty() {
        let catalog = catalog(&[entry("a", "Alpha", 1), entry("b", "Beta", 1)]).await;

        let result = recent_impl(&catalog, CatalogRecentParams { limit: 10, offset: usize::MAX }).await.unwrap();
        assert!(ids(&result).is_empty());
    }

    #[tokio::test]
    async fn test_recent_rejects_bad_limit() {
        let catalog = catalog(&[]).await;

        for limit in [0, MAX_LIMIT + 1] {
            let err = recent_impl(&catalog, CatalogRecentParams { limit, offset: 0 }).await.unwrap_err();
            assert_eq!(err.code.0, -32602);
        }
    }
}
