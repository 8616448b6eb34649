//! # fjord-types
//!
//! Shared domain types for the fjord feedback indexing pipeline.
//!
//! This crate defines the data structures exchanged between the crates:
//! - Responses: the feedback entities being indexed
//! - Work items and jobs: units of asynchronous (un)indexing work
//! - Batch records: audit trail of chunked reindex runs
//! - Index documents: the search-ready form of an entity
//! - Suggestion links: output of suggestion providers
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use fjord_types::{TypeIdentifier, WorkItem};
//!
//! let doctype: TypeIdentifier = "feedback.response".parse().unwrap();
//! let item = WorkItem::new(doctype, 42);
//! assert_eq!(item.attempt_count, 0);
//! ```

pub mod batch;
pub mod config;
pub mod document;
pub mod error;
pub mod response;
pub mod suggestion;
pub mod work;

pub use batch::{BatchRecord, BatchStatus};
pub use config::{NotifySettings, ReindexSettings, RetrySettings, Settings};
pub use document::IndexDocument;
pub use error::FjordError;
pub use response::Response;
pub use suggestion::SuggestionLink;
pub use work::{ChunkJob, Job, TypeIdentifier, WorkItem};
