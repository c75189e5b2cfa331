//! Unified error types for ebook-shelf.
//!
//! Every variant carries a stable code prefix so log lines and MCP error
//! payloads can be matched without parsing free text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the store, the loader and the server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty keyword, unsupported payload shape).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A record is not a structured value or no longer decodes as its type.
    #[error("INVALID_RECORD: {0}")]
    InvalidRecord(String),

    /// A bulk record lacks the collection's declared key field.
    #[error("INVALID_RECORD: record {index} has no usable `{field}` key")]
    MissingKey { index: usize, field: String },

    /// Insert-only write hit an existing key.
    #[error("DUPLICATE_KEY: {0}")]
    DuplicateKey(String),

    /// No record found for the given key.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored body could not be encoded or decoded.
    #[error("STORE_ERROR: serialization failed: {0}")]
    Serialization(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// HTTP error response.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Snapshot could not be read from its location.
    #[error("SOURCE_UNAVAILABLE: {0}")]
    SourceUnavailable(String),

    /// Snapshot is not a readable archive or lacks the catalog entry.
    #[error("ARCHIVE_ERROR: {0}")]
    Archive(String),

    /// Catalog JSON is malformed.
    #[error("CATALOG_INVALID: {0}")]
    CatalogDecode(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::InvalidRecord(_) | Error::MissingKey { .. } => -32602,
            Error::DuplicateKey(_) => -32003,
            Error::NotFound(_) => -32001,
            Error::Database(_) | Error::MigrationFailed(_) | Error::Serialization(_) => -32002,
            Error::InvalidUrl(_) => -32004,
            Error::FetchTimeout(_) => -32006,
            Error::FetchTooLarge(_) => -32007,
            Error::HttpError(_) => -32008,
            Error::SourceUnavailable(_) => -32009,
            Error::Archive(_) => -32010,
            Error::CatalogDecode(_) => -32011,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("abc123".to_string());
        assert!(err.to_string().contains("NOT_FOUND"));
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_missing_key_display() {
        let err = Error::MissingKey { index: 3, field: "id".into() };
        assert_eq!(err.to_string(), "INVALID_RECORD: record 3 has no usable `id` key");
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::NotFound("abc123".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32001);
    }

    #[test]
    fn test_invalid_input_maps_to_invalid_params() {
        let mcp_err: McpError = Error::InvalidInput("keyword is empty".into()).into();
        assert_eq!(mcp_err.code.0, -32602);
        assert!(mcp_err.message.contains("keyword is empty"));
    }
}
