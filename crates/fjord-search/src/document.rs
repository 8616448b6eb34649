//! Mapping between pipeline documents and Tantivy documents.

use tantivy::doc;
use tantivy::schema::Value;
use tantivy::TantivyDocument;

use fjord_types::IndexDocument;

use crate::error::SearchError;
use crate::schema::SearchSchema;

/// Convert an [`IndexDocument`] to a Tantivy document.
///
/// Stored fields are kept as one JSON string so the schema does not depend
/// on any doctype.
pub fn doc_from_index_document(schema: &SearchSchema, document: &IndexDocument) -> TantivyDocument {
    let fields = serde_json::Value::Object(document.fields.clone()).to_string();

    doc!(
        schema.doc_type => document.doctype.clone(),
        schema.doc_id => document.doc_id.clone(),
        schema.text => document.text.clone(),
        schema.fields => fields
    )
}

/// Rebuild an [`IndexDocument`] from a stored Tantivy document.
///
/// `text` is indexed but not stored, so it comes back empty.
pub fn index_document_from_doc(
    schema: &SearchSchema,
    doc: &TantivyDocument,
) -> Result<IndexDocument, SearchError> {
    let text_of = |field| {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };

    let raw_fields = text_of(schema.fields);
    let fields = if raw_fields.is_empty() {
        serde_json::Map::new()
    } else {
        serde_json::from_str(&raw_fields).map_err(|e| SearchError::StoredFields(e.to_string()))?
    };

    Ok(IndexDocument {
        doc_id: text_of(schema.doc_id),
        doctype: text_of(schema.doc_type),
        text: String::new(),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::build_feedback_schema;

    #[test]
    fn test_stored_fields_survive_conversion() {
        let schema = build_feedback_schema();
        let document = IndexDocument::new("12", "feedback.response", "battery drains fast")
            .with_field("happy", false)
            .with_field("product", "firefox");

        let tantivy_doc = doc_from_index_document(&schema, &document);
        let back = index_document_from_doc(&schema, &tantivy_doc).unwrap();

        assert_eq!(back.doc_id, "12");
        assert_eq!(back.doctype, "feedback.response");
        assert_eq!(back.fields.get("product").unwrap(), "firefox");
        assert_eq!(back.fields.get("happy").unwrap(), false);
        assert!(back.text.is_empty());
    }
}
