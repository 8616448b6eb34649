//! Keyword search over indexed feedback using BM25 scoring.

use tantivy::collector::{Count, TopDocs};
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::{IndexReader, TantivyDocument, Term};
use tracing::{debug, info};

use fjord_types::IndexDocument;

use crate::document::index_document_from_doc;
use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::schema::SearchSchema;

/// A search result with relevance score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub doc_id: String,
    pub doctype: String,
    /// BM25 relevance score
    pub score: f32,
    /// Stored document (text is not stored and comes back empty)
    pub document: IndexDocument,
}

/// Searcher for feedback queries.
pub struct FeedbackSearcher {
    reader: IndexReader,
    schema: SearchSchema,
    query_parser: QueryParser,
}

impl FeedbackSearcher {
    /// Create a new searcher from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        let reader = index.reader()?;
        let schema = index.schema().clone();
        let query_parser = QueryParser::for_index(index.index(), vec![schema.text]);

        Ok(Self {
            reader,
            schema,
            query_parser,
        })
    }

    /// Reload the reader to see recent commits.
    pub fn reload(&self) -> Result<(), SearchError> {
        self.reader.reload()?;
        debug!("Reloaded search reader");
        Ok(())
    }

    /// Search the text field, most relevant first.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.search_filtered(query_str, None, limit)
    }

    /// Search restricted to one doctype when `doctype` is set.
    pub fn search_filtered(
        &self,
        query_str: &str,
        doctype: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if query_str.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let text_query = self.query_parser.parse_query(query_str)?;

        let final_query: Box<dyn Query> = match doctype {
            Some(doctype) => {
                let type_term = Term::from_field_text(self.schema.doc_type, doctype);
                let type_query: Box<dyn Query> =
                    Box::new(TermQuery::new(type_term, IndexRecordOption::Basic));
                Box::new(BooleanQuery::new(vec![
                    (Occur::Must, text_query),
                    (Occur::Must, type_query),
                ]))
            }
            None => text_query,
        };

        let top_docs = searcher.search(&final_query, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let document = index_document_from_doc(&self.schema, &doc)?;
            hits.push(SearchHit {
                doc_id: document.doc_id.clone(),
                doctype: document.doctype.clone(),
                score,
                document,
            });
        }

        info!(query = query_str, results = hits.len(), "Search complete");
        Ok(hits)
    }

    /// Find a document by id.
    pub fn get(&self, doc_id: &str) -> Result<Option<IndexDocument>, SearchError> {
        let searcher = self.reader.searcher();
        let term = Term::from_field_text(self.schema.doc_id, doc_id);
        let query = TermQuery::new(term, IndexRecordOption::Basic);

        let top_docs = searcher.search(&query, &TopDocs::with_limit(1))?;
        match top_docs.first() {
            Some((_, address)) => {
                let doc: TantivyDocument = searcher.doc(*address)?;
                Ok(Some(index_document_from_doc(&self.schema, &doc)?))
            }
            None => Ok(None),
        }
    }

    /// Number of live documents.
    pub fn count(&self) -> Result<usize, SearchError> {
        let searcher = self.reader.searcher();
        Ok(searcher.search(&AllQuery, &Count)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SearchIndexConfig;
    use crate::indexer::SearchIndexer;
    use tempfile::TempDir;

    fn indexed(temp_dir: &TempDir) -> SearchIndex {
        let config = SearchIndexConfig::new(temp_dir.path(), "feedback");
        let index = SearchIndex::open_or_create(config).unwrap();
        let indexer = SearchIndexer::new(&index).unwrap();
        indexer
            .bulk_index(&[
                IndexDocument::new("1", "feedback.response", "battery drains fast on mobile"),
                IndexDocument::new("2", "feedback.response", "love the new tabs"),
                IndexDocument::new("3", "feedback.survey", "battery battery battery"),
            ])
            .unwrap();
        indexer.commit().unwrap();
        index
    }

    #[test]
    fn test_search_ranked() {
        let temp_dir = TempDir::new().unwrap();
        let index = indexed(&temp_dir);
        let searcher = FeedbackSearcher::new(&index).unwrap();
        searcher.reload().unwrap();

        let hits = searcher.search("battery", 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_search_filtered_by_doctype() {
        let temp_dir = TempDir::new().unwrap();
        let index = indexed(&temp_dir);
        let searcher = FeedbackSearcher::new(&index).unwrap();
        searcher.reload().unwrap();

        let hits = searcher
            .search_filtered("battery", Some("feedback.response"), 10)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "1");
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let index = indexed(&temp_dir);
        let searcher = FeedbackSearcher::new(&index).unwrap();
        assert!(searcher.search("   ", 10).unwrap().is_empty());
    }

    #[test]
    fn test_get_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let index = indexed(&temp_dir);
        let searcher = FeedbackSearcher::new(&index).unwrap();
        searcher.reload().unwrap();

        assert_eq!(searcher.get("2").unwrap().unwrap().doctype, "feedback.response");
        assert!(searcher.get("99").unwrap().is_none());
    }
}
