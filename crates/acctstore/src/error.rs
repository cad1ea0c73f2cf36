//! Error types for the account store.

use thiserror::Error;

/// Errors that can occur in storage and configuration operations.
///
/// Store operations never return these to their callers; the store logs
/// them and keeps its in-memory state. Storage backends return them directly.
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the value would exceed the storage quota.
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} bytes available")]
    QuotaExceeded {
        /// Bytes the write would occupy in total.
        needed: usize,
        /// Configured quota in bytes.
        quota: usize,
    },

    /// The storage backend cannot be used.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
