//! # fjord-search
//!
//! Full-text search over feedback using Tantivy.
//!
//! ## Features
//! - Embedded Tantivy index per index name, persisted with MmapDirectory
//! - Delete-then-add bulk indexing keyed by document id
//! - Delete by document id
//! - BM25 keyword search with doctype filtering

pub mod document;
pub mod error;
pub mod index;
pub mod indexer;
pub mod schema;
pub mod searcher;

pub use document::{doc_from_index_document, index_document_from_doc};
pub use error::SearchError;
pub use index::{open_or_create_index, SearchIndex, SearchIndexConfig};
pub use indexer::SearchIndexer;
pub use schema::{build_feedback_schema, SearchSchema};
pub use searcher::{FeedbackSearcher, SearchHit};
