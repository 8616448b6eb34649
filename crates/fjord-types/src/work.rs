//! Work items and jobs for asynchronous (un)indexing.
//!
//! Jobs cross the queue boundary as JSON, so every type here carries only
//! plain data: doctypes travel as their stable string identifier and are
//! resolved back to a handler by the consumer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FjordError;

/// Stable string reference to a searchable entity type.
///
/// Format: lowercase dotted path, e.g. `feedback.response`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeIdentifier(String);

impl TypeIdentifier {
    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TypeIdentifier {
    type Err = FjordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && !s.starts_with('.')
            && !s.ends_with('.')
            && s.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.');
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(FjordError::InvalidTypeIdentifier(s.to_string()))
        }
    }
}

impl TryFrom<String> for TypeIdentifier {
    type Error = FjordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeIdentifier> for String {
    fn from(value: TypeIdentifier) -> Self {
        value.0
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entity to (re)index or remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Doctype of the entity
    pub doctype: TypeIdentifier,
    /// Entity primary key
    pub entity_id: u64,
    /// Number of failed attempts so far
    #[serde(default)]
    pub attempt_count: u32,
}

impl WorkItem {
    /// Create a first-attempt work item.
    pub fn new(doctype: TypeIdentifier, entity_id: u64) -> Self {
        Self {
            doctype,
            entity_id,
            attempt_count: 0,
        }
    }

    /// Copy of this item for the next attempt.
    pub fn next_attempt(&self) -> Self {
        Self {
            doctype: self.doctype.clone(),
            entity_id: self.entity_id,
            attempt_count: self.attempt_count + 1,
        }
    }
}

/// A chunk of a batch reindex run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkJob {
    /// Name of the index to write into
    pub index: String,
    /// Batch this chunk belongs to
    pub batch_id: String,
    /// Id of the batch record tracking this chunk
    pub record_id: String,
    /// Doctype and ordered ids to index
    pub chunk: (TypeIdentifier, Vec<u64>),
}

/// Unit of work handed to the job queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Job {
    /// Index (insert or update) one entity
    IndexItem(WorkItem),
    /// Remove one entity from the index
    UnindexItem(WorkItem),
    /// Index a chunk of a batch reindex
    IndexChunk(ChunkJob),
}

impl Job {
    /// Task name used in logs.
    pub fn task_name(&self) -> &'static str {
        match self {
            Job::IndexItem(_) => "index_item",
            Job::UnindexItem(_) => "unindex_item",
            Job::IndexChunk(_) => "index_chunk",
        }
    }

    /// Serialize to JSON bytes for the queue transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from queue transport bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
