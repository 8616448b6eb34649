//! Error types for the indexing pipeline.

use fjord_search::SearchError;
use fjord_storage::StorageError;
use fjord_types::FjordError;
use thiserror::Error;

use crate::queue::QueueError;

/// Errors that can occur in the indexing pipeline
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Search index error
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Job queue error
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Domain error (invalid status transition, configuration)
    #[error(transparent)]
    Domain(#[from] FjordError),

    /// Doctype is not registered
    #[error("Unknown doctype: {0}")]
    UnknownDocType(String),

    /// No search index with this name
    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    /// Entity does not exist in the store
    #[error("Entity not found: {doctype} {entity_id}")]
    EntityNotFound { doctype: String, entity_id: u64 },

    /// Entity could not be turned into a document
    #[error("Extract error: {0}")]
    Extract(String),

    /// Batch record missing for a chunk job
    #[error("Batch record not found: {batch_id}/{record_id}")]
    RecordNotFound { batch_id: String, record_id: String },

    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A live (un)indexing job failed on its final attempt
    #[error("{task} {doctype} {entity_id} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        task: &'static str,
        doctype: String,
        entity_id: u64,
        attempts: u32,
        #[source]
        source: Box<IndexingError>,
    },
}

impl From<serde_json::Error> for IndexingError {
    fn from(err: serde_json::Error) -> Self {
        IndexingError::Extract(err.to_string())
    }
}
