//! Search document types.
//!
//! This module defines the document structure that is written to the search index
//! for one record of the system of record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved key holding the document type in the indexed body.
pub const DOC_TYPE_FIELD: &str = "doc_type";

/// Reserved key holding the indexing timestamp in the indexed body.
pub const INDEXED_AT_FIELD: &str = "indexed_at";

/// Document representation for the search index.
///
/// # Fields
///
/// - `doc_type`: The document type of the model the record belongs to
/// - `record_id`: Primary key of the record in the system of record
/// - `source`: Serialized record fields
/// - `indexed_at`: Timestamp when the document was built
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchDocument {
    pub doc_type: String,
    pub record_id: String,
    pub source: Map<String, Value>,
    pub indexed_at: DateTime<Utc>,
}

impl SearchDocument {
    /// Create a new document stamped with the current time.
    ///
    /// # Example
    ///
    /// ```
    /// use search_sync_shared::SearchDocument;
    /// use serde_json::Map;
    ///
    /// let doc = SearchDocument::new("model-article", "42", Map::new());
    /// assert_eq!(doc.document_id(), "model-article_42");
    /// ```
    pub fn new(
        doc_type: impl Into<String>,
        record_id: impl Into<String>,
        source: Map<String, Value>,
    ) -> Self {
        Self {
            doc_type: doc_type.into(),
            record_id: record_id.into(),
            source,
            indexed_at: Utc::now(),
        }
    }

    /// Generate the document ID used in the search index.
    ///
    /// The document ID combines doc_type and record_id so that models sharing
    /// one index never collide.
    pub fn document_id(&self) -> String {
        document_id(&self.doc_type, &self.record_id)
    }

    /// Build the JSON body sent to the index.
    ///
    /// Reserved keys overwrite same-named source fields.
    pub fn to_body(&self) -> Value {
        let mut body = self.source.clone();
        body.insert(
            DOC_TYPE_FIELD.to_string(),
            Value::String(self.doc_type.clone()),
        );
        body.insert(
            INDEXED_AT_FIELD.to_string(),
            Value::String(self.indexed_at.to_rfc3339()),
        );
        Value::Object(body)
    }
}

/// Document ID for a record of a given document type.
pub fn document_id(doc_type: &str, record_id: &str) -> String {
    format!("{}_{}", doc_type, record_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_document_id() {
        let doc = SearchDocument::new("model-article", "17", Map::new());
        assert_eq!(doc.document_id(), "model-article_17");
    }

    #[test]
    fn test_to_body_includes_reserved_fields() {
        let doc = SearchDocument::new(
            "model-article",
            "1",
            source(json!({"title": "Hello", "views": 3})),
        );

        let body = doc.to_body();

        assert_eq!(body["title"], "Hello");
        assert_eq!(body["views"], 3);
        assert_eq!(body["doc_type"], "model-article");
        assert!(body["indexed_at"].is_string());
    }

    #[test]
    fn test_reserved_fields_overwrite_source() {
        let doc = SearchDocument::new(
            "model-article",
            "1",
            source(json!({"doc_type": "spoofed"})),
        );

        assert_eq!(doc.to_body()["doc_type"], "model-article");
    }
}
