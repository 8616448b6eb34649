//! Tantivy index management.
//!
//! Each index name gets its own directory under the configured root.

use std::path::{Path, PathBuf};

use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info};

use crate::error::SearchError;
use crate::schema::{build_feedback_schema, SearchSchema};

/// Default memory budget for IndexWriter (50MB)
const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Search index configuration
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Directory holding all indexes
    pub root_path: PathBuf,
    /// Name of this index (sub-directory of `root_path`)
    pub index_name: String,
    /// Memory budget for writer in MB
    pub writer_memory_mb: usize,
}

impl SearchIndexConfig {
    pub fn new(root_path: impl Into<PathBuf>, index_name: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            index_name: index_name.into(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }

    /// Directory of this index
    pub fn index_path(&self) -> PathBuf {
        self.root_path.join(&self.index_name)
    }
}

/// Wrapper for Tantivy index with schema access.
pub struct SearchIndex {
    index: Index,
    schema: SearchSchema,
    config: SearchIndexConfig,
}

impl SearchIndex {
    /// Open existing index or create new one.
    pub fn open_or_create(config: SearchIndexConfig) -> Result<Self, SearchError> {
        let path = config.index_path();
        let index = open_or_create_index(&path)?;
        let schema = SearchSchema::from_schema(index.schema())?;

        info!(path = ?path, index = %config.index_name, "Opened search index");

        Ok(Self {
            index,
            schema,
            config,
        })
    }

    /// Get the search schema
    pub fn schema(&self) -> &SearchSchema {
        &self.schema
    }

    /// Get the underlying Tantivy index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Name of this index
    pub fn name(&self) -> &str {
        &self.config.index_name
    }

    /// Create an IndexWriter with configured memory budget
    pub fn writer(&self) -> Result<IndexWriter, SearchError> {
        let memory_budget = self.config.writer_memory_mb * 1024 * 1024;
        let writer = self.index.writer(memory_budget)?;
        debug!(memory_mb = self.config.writer_memory_mb, "Created index writer");
        Ok(writer)
    }

    /// Create an IndexReader that reloads on commit
    pub fn reader(&self) -> Result<IndexReader, SearchError> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;
        Ok(reader)
    }

    /// Get the index path
    pub fn path(&self) -> PathBuf {
        self.config.index_path()
    }
}

/// Open an existing index or create a new one.
///
/// Uses MmapDirectory for persistence.
pub fn open_or_create_index(path: &Path) -> Result<Index, SearchError> {
    if path.join("meta.json").exists() {
        debug!(path = ?path, "Opening existing index");
        Ok(Index::open_in_dir(path)?)
    } else {
        info!(path = ?path, "Creating new index");
        std::fs::create_dir_all(path)?;
        let schema = build_feedback_schema();
        Ok(Index::create_in_dir(path, schema.schema().clone())?)
    }
}
