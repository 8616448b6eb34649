//! Error types shared across the fjord crates.

use thiserror::Error;

/// Unified error type for domain-level operations.
#[derive(Debug, Error)]
pub enum FjordError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid type identifier
    #[error("Invalid type identifier: {0}")]
    InvalidTypeIdentifier(String),

    /// Batch record status change that would move backwards
    #[error("Invalid batch status transition: {from} -> {to}")]
    InvalidTransition {
        from: crate::BatchStatus,
        to: crate::BatchStatus,
    },
}
