//! Search backend seam used by the worker.

use fjord_search::{SearchError, SearchIndexer};
use fjord_types::IndexDocument;

/// Write access to one search index.
pub trait SearchBackend: Send + Sync {
    /// Add or replace documents.
    fn bulk_index(&self, docs: &[IndexDocument]) -> Result<usize, SearchError>;

    /// Remove a document by id.
    fn delete(&self, doc_id: &str) -> Result<(), SearchError>;

    /// Make pending changes visible.
    fn commit(&self) -> Result<(), SearchError>;

    /// Discard changes staged since the last commit.
    fn rollback(&self) -> Result<(), SearchError>;
}

impl SearchBackend for SearchIndexer {
    fn bulk_index(&self, docs: &[IndexDocument]) -> Result<usize, SearchError> {
        SearchIndexer::bulk_index(self, docs)
    }

    fn delete(&self, doc_id: &str) -> Result<(), SearchError> {
        SearchIndexer::delete(self, doc_id)
    }

    fn commit(&self) -> Result<(), SearchError> {
        SearchIndexer::commit(self).map(|_| ())
    }

    fn rollback(&self) -> Result<(), SearchError> {
        SearchIndexer::rollback(self).map(|_| ())
    }
}
