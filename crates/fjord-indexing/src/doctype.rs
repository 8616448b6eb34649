//! Doctype handlers and their registry.
//!
//! A doctype knows where its entities live in the store and how to turn one
//! into an [`IndexDocument`]. Jobs only carry the [`TypeIdentifier`]; the
//! worker resolves it here.

use std::collections::HashMap;
use std::sync::Arc;

use fjord_types::{IndexDocument, Response, TypeIdentifier};

use crate::error::IndexingError;

/// Extraction handler for one searchable entity type.
pub trait DocType: Send + Sync {
    /// Stable identifier carried by jobs.
    fn name(&self) -> &TypeIdentifier;

    /// Storage model the entities are kept under.
    fn model(&self) -> &str {
        self.name().as_str()
    }

    /// Document id in the search index for an entity id.
    fn doc_id(&self, entity_id: u64) -> String {
        format!("{}:{}", self.name(), entity_id)
    }

    /// Build the search document from the stored entity bytes.
    fn extract_doc(&self, entity_id: u64, raw: &[u8]) -> Result<IndexDocument, IndexingError>;
}

/// Lookup table from type identifier to handler.
#[derive(Default, Clone)]
pub struct DocTypeRegistry {
    doctypes: HashMap<TypeIdentifier, Arc<dyn DocType>>,
}

impl DocTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any handler with the same name.
    pub fn register(&mut self, doctype: Arc<dyn DocType>) {
        self.doctypes.insert(doctype.name().clone(), doctype);
    }

    /// Resolve a type identifier to its handler.
    pub fn resolve(&self, name: &TypeIdentifier) -> Result<Arc<dyn DocType>, IndexingError> {
        self.doctypes
            .get(name)
            .cloned()
            .ok_or_else(|| IndexingError::UnknownDocType(name.to_string()))
    }

    pub fn contains(&self, name: &TypeIdentifier) -> bool {
        self.doctypes.contains_key(name)
    }

    /// Registered identifiers in sorted order.
    pub fn names(&self) -> Vec<TypeIdentifier> {
        let mut names: Vec<_> = self.doctypes.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Doctype for feedback [`Response`] entities.
pub struct ResponseDocType {
    name: TypeIdentifier,
}

impl ResponseDocType {
    pub const NAME: &'static str = "feedback.response";

    pub fn new() -> Result<Self, IndexingError> {
        Ok(Self {
            name: Self::NAME.parse()?,
        })
    }
}

impl DocType for ResponseDocType {
    fn name(&self) -> &TypeIdentifier {
        &self.name
    }

    fn extract_doc(&self, entity_id: u64, raw: &[u8]) -> Result<IndexDocument, IndexingError> {
        let response = Response::from_bytes(raw)?;
        if response.id != entity_id {
            return Err(IndexingError::Extract(format!(
                "stored response has id {} but was fetched as {}",
                response.id, entity_id
            )));
        }

        Ok(IndexDocument::new(
            self.doc_id(entity_id),
            self.name.as_str(),
            response.description,
        )
        .with_field("id", response.id)
        .with_field("happy", response.happy)
        .with_field("url", response.url)
        .with_field("product", response.product)
        .with_field("version", response.version)
        .with_field("platform", response.platform)
        .with_field("locale", response.locale)
        .with_field("created", response.created.to_rfc3339()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> DocTypeRegistry {
        let mut registry = DocTypeRegistry::new();
        registry.register(Arc::new(ResponseDocType::new().unwrap()));
        registry
    }

    #[test]
    fn test_resolve_registered() {
        let registry = registry();
        let name: TypeIdentifier = "feedback.response".parse().unwrap();
        assert_eq!(registry.resolve(&name).unwrap().name(), &name);
        assert_eq!(registry.names(), vec![name]);
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = registry();
        let name: TypeIdentifier = "feedback.survey".parse().unwrap();
        assert!(matches!(
            registry.resolve(&name),
            Err(IndexingError::UnknownDocType(n)) if n == "feedback.survey"
        ));
    }

    #[test]
    fn test_extract_response() {
        let doctype = ResponseDocType::new().unwrap();
        let response = Response::new(12, false, "battery drains fast")
            .with_url("https://example.com/")
            .with_product("firefox");

        let doc = doctype.extract_doc(12, &response.to_bytes().unwrap()).unwrap();
        assert_eq!(doc.doc_id, "feedback.response:12");
        assert_eq!(doc.doctype, "feedback.response");
        assert_eq!(doc.text, "battery drains fast");
        assert_eq!(doc.fields.get("happy").unwrap(), false);
        assert_eq!(doc.fields.get("product").unwrap(), "firefox");
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let doctype = ResponseDocType::new().unwrap();
        assert!(matches!(
            doctype.extract_doc(1, b"not json"),
            Err(IndexingError::Extract(_))
        ));
    }
}
