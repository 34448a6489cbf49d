//! Error types for the overload_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for overload_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP transport error talking to the remote store
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Fetching the persisted exercise values or log failed
    #[error("Load error: {0}")]
    Load(String),

    /// Writing values or log rows to the store failed
    #[error("Save error: {0}")]
    Save(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
