//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search backend operations,
//! allowing different implementations (OpenSearch, Elasticsearch, mocks).

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::types::{
    BatchOperationSummary, CreateIndexRequest, DeleteDocumentRequest, IndexDocumentRequest,
};
use search_sync_shared::SearchDocument;

/// Abstracts the underlying search backend.
///
/// Implementations are injected into `SearchIndexService`. All methods return
/// `SearchIndexError`; transport-level failures must be reported as
/// `SearchIndexError::ConnectionError` so that callers can recognise an
/// unreachable backend.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Probe the backend.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the backend answered with a success status
    /// * `Err(SearchIndexError::ConnectionError)` - If it could not be reached
    async fn ping(&self) -> Result<(), SearchIndexError>;

    /// Create the index if it does not exist, otherwise merge the request's
    /// mapping properties into the existing index.
    ///
    /// Calling this repeatedly with the same request is harmless.
    async fn create_index(&self, request: &CreateIndexRequest) -> Result<(), SearchIndexError>;

    /// Index a full document, replacing any previous version.
    async fn index_document(&self, request: &IndexDocumentRequest) -> Result<(), SearchIndexError>;

    /// Delete a document from the search index.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    async fn delete_document(&self, request: &DeleteDocumentRequest)
        -> Result<(), SearchIndexError>;

    /// Index many documents in one request.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document outcome of the request
    /// * `Err(SearchIndexError)` - If the request failed as a whole
    async fn bulk_index_documents(
        &self,
        index: &str,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;
}
