//! Error types for the catalog loaders and sessions

use thiserror::Error;

use crate::api::ResourceKind;

/// Errors from a single HTTP round-trip against the data API.
///
/// Loaders treat every variant as a per-item failure: the item is skipped and
/// loading continues. Only a failed index fetch escalates to [`CatalogError`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success response status
    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    /// Response body was not the expected JSON shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),
}

impl FetchError {
    /// Whether a later attempt could plausibly succeed.
    ///
    /// Used for log levels only; nothing is retried within a session.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::HttpStatus(status) => *status >= 500 || *status == 429,
            FetchError::Timeout(_) => true,
            FetchError::Request(e) => e.is_timeout() || e.is_connect(),
            FetchError::Decode(_) => false,
        }
    }
}

/// Session-level errors surfaced to the view
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The index listing could not be fetched; the session has no data
    #[error("Failed to load {kind} index: {source}")]
    Index {
        kind: ResourceKind,
        #[source]
        source: FetchError,
    },

    /// An earlier index fetch failed; the session does not retry it
    #[error("{reason} (not retried in this session)")]
    IndexUnavailable { kind: ResourceKind, reason: String },

    /// Configuration validation failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (terminal, log file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        assert!(FetchError::HttpStatus(503).is_transient());
        assert!(FetchError::HttpStatus(429).is_transient());
        assert!(!FetchError::HttpStatus(404).is_transient());
        assert!(FetchError::Timeout("https://pokeapi.co/api/v2/pokemon/1/".into()).is_transient());
    }

    #[test]
    fn index_error_names_the_kind() {
        let err = CatalogError::Index {
            kind: ResourceKind::Move,
            source: FetchError::HttpStatus(500),
        };
        assert_eq!(err.to_string(), "Failed to load move index: HTTP error: 500");
    }
}
