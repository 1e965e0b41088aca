//! Request and response types for search index operations.

use serde_json::Value;

use crate::errors::SearchIndexError;
use search_sync_shared::types::search_document;
use search_sync_shared::SearchDocument;

/// Request to index (create or replace) one document.
#[derive(Debug, Clone)]
pub struct IndexDocumentRequest {
    /// Target index name.
    pub index: String,
    /// The document to write.
    pub document: SearchDocument,
}

/// Request to delete one document from the search index.
///
/// The document is identified by its doc_type and the record's primary key.
#[derive(Debug, Clone)]
pub struct DeleteDocumentRequest {
    /// Target index name.
    pub index: String,
    /// Document type of the record's model.
    pub doc_type: String,
    /// Primary key of the record.
    pub record_id: String,
}

impl DeleteDocumentRequest {
    /// The ID of the document to delete.
    pub fn document_id(&self) -> String {
        search_document::document_id(&self.doc_type, &self.record_id)
    }
}

/// Request to create an index, or merge mappings into an existing one.
#[derive(Debug, Clone)]
pub struct CreateIndexRequest {
    /// Index name.
    pub index: String,
    /// Settings and mappings body.
    pub body: Value,
}

/// Result of a batch operation for a single item.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document's ID in the index.
    pub document_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// Lets callers handle partial failures: a bulk request that reached the backend
/// reports each item's outcome here instead of failing as a whole.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// A summary with no items.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a summary from individual results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Append another summary's counts and results to this one.
    pub fn merge(&mut self, other: BatchOperationSummary) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.results.extend(other.results);
    }

    /// Results of the failed items.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
