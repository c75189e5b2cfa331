//! Catalog snapshot locations.
//!
//! A configured location is either a network URL (`http`/`https`) or a local
//! path. Remote locations are canonicalized: whitespace trimmed, host
//! lowercased, fragment dropped, query kept as given. `file://` URLs are
//! turned into plain paths.

use std::fmt;
use std::path::PathBuf;

use url::Url;

/// Error type for unusable snapshot locations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("empty catalog location")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Where the compressed catalog snapshot is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Remote(Url),
    Local(PathBuf),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Remote(url) => write!(f, "{url}"),
            Location::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Location {
    /// Parse a configured location.
    pub fn parse(input: &str) -> Result<Self, LocationError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(LocationError::Empty);
        }

        let Some((scheme, _)) = trimmed.split_once("://") else {
            return Ok(Location::Local(PathBuf::from(trimmed)));
        };

        let mut parsed = Url::parse(trimmed).map_err(|e| LocationError::InvalidUrl(e.to_string()))?;

        match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => {}
            "file" => {
                return parsed
                    .to_file_path()
                    .map(Location::Local)
                    .map_err(|_| LocationError::InvalidUrl(trimmed.to_string()));
            }
            other => return Err(LocationError::UnsupportedScheme(other.to_string())),
        }

        if let Some(host) = parsed.host_str().map(str::to_lowercase) {
            parsed
                .set_host(Some(&host))
                .map_err(|e| LocationError::InvalidUrl(e.to_string()))?;
        }

        parsed.set_fragment(None);

        Ok(Location::Remote(parsed))
    }
}
