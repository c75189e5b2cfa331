//! MCP server handler implementation.
//!
//! This module defines the server handler that routes catalog tool calls to
//! their implementations.

use crate::tools::{
    CatalogGetParams, CatalogRecentParams, CatalogSearchParams, get_impl, recent_impl, search_impl, status_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shelf_core::{CatalogEntry, Collection};

/// The MCP server handler for shelf-mcp.
#[derive(Clone)]
pub struct ShelfServer {
    tool_router: ToolRouter<Self>,
    catalog: Collection<CatalogEntry>,
}

#[tool_router]
impl ShelfServer {
    /// Create a handler answering from `catalog`.
    pub fn new(catalog: Collection<CatalogEntry>) -> Self {
        Self { tool_router: Self::tool_router(), catalog }
    }

    #[tool(description = "Search the ebook catalog by title. Case-insensitive substring match, results ordered by name.")]
    async fn catalog_search(&self, params: Parameters<CatalogSearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.catalog, params.0).await
    }

    #[tool(description = "Get one ebook catalog entry by id.")]
    async fn catalog_get(&self, params: Parameters<CatalogGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.catalog, params.0).await
    }

    #[tool(description = "List the most recently stored catalog entries, newest first.")]
    async fn catalog_recent(&self, params: Parameters<CatalogRecentParams>) -> Result<CallToolResult, McpError> {
        recent_impl(&self.catalog, params.0).await
    }

    #[tool(description = "Report how many catalog entries are stored and the size of the last ingested snapshot.")]
    async fn catalog_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.catalog).await
    }
}

impl ServerHandler for ShelfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shelf-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some("Search a locally cached ebook catalog. Start with catalog_search.".into()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::catalog;

    #[tokio::test]
    async fn test_lists_catalog_tools() {
        let server = ShelfServer::new(catalog(&[]).await);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(names, ["catalog_get", "catalog_recent", "catalog_search", "catalog_status"]);
    }

    #[tokio::test]
    async fn test_server_info() {
        let server = ShelfServer::new(catalog(&[]).await);
        let info = server.get_info();

        assert_eq!(info.server_info.name, "shelf-mcp");
        assert!(info.capabilities.tools.is_some());
    }
}
