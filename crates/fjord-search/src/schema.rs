//! Tantivy schema for feedback documents.

use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};

use crate::SearchError;

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct SearchSchema {
    schema: Schema,
    /// Doctype that produced the document (STRING | STORED)
    pub doc_type: Field,
    /// Primary key (STRING | STORED)
    pub doc_id: Field,
    /// Searchable text (TEXT)
    pub text: Field,
    /// Doctype-specific fields as a JSON string (STORED)
    pub fields: Field,
}

impl SearchSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create a SearchSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaMismatch(format!("missing {} field", name)))
        };
        let doc_type = field("doc_type")?;
        let doc_id = field("doc_id")?;
        let text = field("text")?;
        let fields = field("fields")?;

        Ok(Self {
            schema,
            doc_type,
            doc_id,
            text,
            fields,
        })
    }
}

/// Build the feedback search schema.
pub fn build_feedback_schema() -> SearchSchema {
    let mut schema_builder = Schema::builder();

    let doc_type = schema_builder.add_text_field("doc_type", STRING | STORED);
    let doc_id = schema_builder.add_text_field("doc_id", STRING | STORED);
    let text = schema_builder.add_text_field("text", TEXT);
    let fields = schema_builder.add_text_field("fields", STORED);

    SearchSchema {
        schema: schema_builder.build(),
        doc_type,
        doc_id,
        text,
        fields,
    }
}
