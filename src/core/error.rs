//! Error types and error handling for the reshelve catalog.
//!
//! This module defines the error types used throughout the
//! catalog, staging and swap layers. Transport adapters map these
//! onto their own status codes.

use thiserror::Error;

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, ReshelveError>;

/// Main error type for the catalog
#[derive(Error, Debug)]
pub enum ReshelveError {
    #[error("Catalog busy: index '{name}' is still locked after {waited_ms}ms")]
    CatalogBusy { name: String, waited_ms: u64 },

    #[error("Index not found: {0}")]
    NotFound(String),

    #[error("Index name rejected: {0}")]
    NameRejected(String),

    #[error("Index already exists: {0}")]
    AlreadyExists(String),

    #[error("Index closed: {0}")]
    IndexClosed(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Staging I/O failed for '{path}': {source}")]
    StagingIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest corrupt: '{0}' is in neither staging nor trash")]
    ManifestCorrupt(String),

    #[error("Swap aborted for '{name}': {reason}")]
    SwapAborted { name: String, reason: String },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML encoding error: {0}")]
    TomlEncodeError(#[from] toml::ser::Error),
}

impl ReshelveError {
    /// Wrap an I/O error raised while touching a staged path
    pub fn staging(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        ReshelveError::StagingIo {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReshelveError::NotFound(_))
    }

    /// Check if the catalog refused the call because a swap is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, ReshelveError::CatalogBusy { .. })
    }

    /// Check if this is a bad request error (invalid input)
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            ReshelveError::NameRejected(_)
                | ReshelveError::InvalidPath(_)
                | ReshelveError::AlreadyExists(_)
                | ReshelveError::ConfigError(_)
        )
    }

    /// Check if the transport layer may retry the same call unchanged
    ///
    /// A swap that aborted before touching D, or a busy catalog, leaves
    /// everything as it was.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReshelveError::CatalogBusy { .. } | ReshelveError::SwapAborted { .. }
        )
    }
}
