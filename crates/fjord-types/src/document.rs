//! Search-ready document representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flattened, search-engine-ready form of one entity.
///
/// `text` is the full-text searchable content; `fields` is stored verbatim
/// and its shape is owned by the doctype that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Primary key in the index
    pub doc_id: String,
    /// Doctype that produced the document
    pub doctype: String,
    /// Searchable text
    pub text: String,
    /// Stored fields
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl IndexDocument {
    pub fn new(
        doc_id: impl Into<String>,
        doctype: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            doctype: doctype.into(),
            text: text.into(),
            fields: Map::new(),
        }
    }

    /// Add a stored field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}
