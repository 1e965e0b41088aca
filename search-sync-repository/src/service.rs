//! Search index service implementation.
//!
//! This module provides the service the sync layer talks to. It validates
//! requests, enforces batch limits and delegates to a `SearchIndexProvider`.

use std::sync::Arc;

use tracing::instrument;

use crate::config::SearchIndexServiceConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::{
    BatchOperationSummary, CreateIndexRequest, DeleteDocumentRequest, IndexDocumentRequest,
};
use crate::utils::{validate_index_name, validate_record_id};
use search_sync_shared::SearchDocument;

/// The main service for interacting with the search index.
///
/// The provider is shared (`Arc`) so that one service can back the index
/// managers of every synchronized model.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use search_sync_repository::{OpenSearchProvider, SearchIndexService};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = Arc::new(OpenSearchProvider::new("http://localhost:9200", None).await?);
/// let service = SearchIndexService::new(provider);
///
/// service.ping().await?;
/// # Ok(())
/// # }
/// ```
pub struct SearchIndexService {
    provider: Arc<dyn SearchIndexProvider>,
    config: SearchIndexServiceConfig,
}

impl SearchIndexService {
    /// Create a new SearchIndexService with default configuration.
    ///
    /// The default configuration includes a batch size limit of 1000 documents.
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self {
            provider,
            config: SearchIndexServiceConfig::default(),
        }
    }

    /// Create a new SearchIndexService with custom configuration.
    pub fn with_config(
        provider: Arc<dyn SearchIndexProvider>,
        config: SearchIndexServiceConfig,
    ) -> Self {
        Self { provider, config }
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    /// Probe the search backend.
    pub async fn ping(&self) -> Result<(), SearchIndexError> {
        self.provider.ping().await
    }

    /// Create the index, or merge mappings into it if it already exists.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError::ValidationError)` - If the index name is invalid
    /// * `Err(SearchIndexError)` - If the backend rejects the request
    #[instrument(skip(self, request), fields(index = %request.index))]
    pub async fn ensure_index(&self, request: CreateIndexRequest) -> Result<(), SearchIndexError> {
        validate_index_name(&request.index)?;
        self.provider.create_index(&request).await
    }

    /// Index a single document, replacing any previous version.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was written
    /// * `Err(SearchIndexError::ValidationError)` - If the index name or record id is invalid
    /// * `Err(SearchIndexError)` - If the operation fails
    pub async fn index(&self, request: IndexDocumentRequest) -> Result<(), SearchIndexError> {
        validate_index_name(&request.index)?;
        validate_record_id(&request.document.record_id)?;

        self.provider.index_document(&request).await
    }

    /// Delete a document. A missing document is not an error.
    pub async fn delete(&self, request: DeleteDocumentRequest) -> Result<(), SearchIndexError> {
        validate_index_name(&request.index)?;
        validate_record_id(&request.record_id)?;

        self.provider.delete_document(&request).await
    }

    /// Index many documents into one index.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document outcome
    /// * `Err(SearchIndexError::BatchSizeExceeded)` - If the batch size exceeds the configured maximum
    /// * `Err(SearchIndexError::ValidationError)` - If the index name or any record id is invalid
    /// * `Err(SearchIndexError)` - If the bulk operation fails entirely
    ///
    /// # Note
    ///
    /// Individual document failures are reported in the summary rather than
    /// failing the whole operation.
    #[instrument(skip(self, documents), fields(index = %index, document_count = documents.len()))]
    pub async fn batch_index(
        &self,
        index: &str,
        documents: Vec<SearchDocument>,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        self.validate_batch_size(documents.len())?;
        validate_index_name(index)?;

        for document in &documents {
            validate_record_id(&document.record_id)?;
        }

        self.provider.bulk_index_documents(index, &documents).await
    }

    /// Maximum batch size accepted by `batch_index`, if limited.
    pub fn max_batch_size(&self) -> Option<usize> {
        self.config.max_batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BatchOperationResult;
    use async_trait::async_trait;
    use serde_json::{json, Map};
    use std::sync::Mutex;

    /// Mock provider for testing
    #[derive(Default)]
    struct MockProvider {
        indexed: Mutex<Vec<IndexDocumentRequest>>,
        deleted: Mutex<Vec<DeleteDocumentRequest>>,
        created: Mutex<Vec<CreateIndexRequest>>,
        bulk_calls: Mutex<usize>,
        unreachable: bool,
    }

    #[async_trait]
    impl SearchIndexProvider for MockProvider {
        async fn ping(&self) -> Result<(), SearchIndexError> {
            if self.unreachable {
                return Err(SearchIndexError::connection("Connection refused"));
            }
            Ok(())
        }

        async fn create_index(
            &self,
            request: &CreateIndexRequest,
        ) -> Result<(), SearchIndexError> {
            self.created.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn index_document(
            &self,
            request: &IndexDocumentRequest,
        ) -> Result<(), SearchIndexError> {
            self.indexed.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn delete_document(
            &self,
            request: &DeleteDocumentRequest,
        ) -> Result<(), SearchIndexError> {
            self.deleted.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn bulk_index_documents(
            &self,
            _index: &str,
            documents: &[SearchDocument],
        ) -> Result<BatchOperationSummary, SearchIndexError> {
            *self.bulk_calls.lock().unwrap() += 1;
            Ok(BatchOperationSummary::from_results(
                documents
                    .iter()
                    .map(|d| BatchOperationResult {
                        document_id: d.document_id(),
                        success: true,
                        error: None,
                    })
                    .collect(),
            ))
        }
    }

    fn document(record_id: &str) -> SearchDocument {
        SearchDocument::new("model-article", record_id, Map::new())
    }

    #[tokio::test]
    async fn test_ping_propagates_connection_error() {
        let provider = MockProvider {
            unreachable: true,
            ..Default::default()
        };
        let service = SearchIndexService::new(Arc::new(provider));

        let err = service.ping().await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_index_validation() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::new(provider.clone());

        let request = IndexDocumentRequest {
            index: "Invalid Index".to_string(),
            document: document("1"),
        };
        assert!(service.index(request).await.is_err());

        let request = IndexDocumentRequest {
            index: "django".to_string(),
            document: document(""),
        };
        assert!(service.index(request).await.is_err());

        assert!(provider.indexed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_index_delegates() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::new(provider.clone());

        let request = IndexDocumentRequest {
            index: "django".to_string(),
            document: document("7"),
        };
        service.index(request).await.unwrap();

        let indexed = provider.indexed.lock().unwrap();
        assert_eq!(indexed.len(), 1);
        assert_eq!(indexed[0].document.document_id(), "model-article_7");
    }

    #[tokio::test]
    async fn test_delete_validation() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::new(provider.clone());

        let request = DeleteDocumentRequest {
            index: "django".to_string(),
            doc_type: "model-article".to_string(),
            record_id: "".to_string(),
        };
        assert!(service.delete(request).await.is_err());
        assert!(provider.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_index_validates_name() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::new(provider.clone());

        let request = CreateIndexRequest {
            index: "_hidden".to_string(),
            body: json!({}),
        };
        assert!(service.ensure_index(request).await.is_err());

        let request = CreateIndexRequest {
            index: "django".to_string(),
            body: json!({}),
        };
        service.ensure_index(request).await.unwrap();
        assert_eq!(provider.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_index_empty_skips_provider() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::new(provider.clone());

        let result = service.batch_index("django", vec![]).await.unwrap();

        assert_eq!(result.total, 0);
        assert!(result.results.is_empty());
        assert_eq!(*provider.bulk_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_index_multiple() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::new(provider);

        let result = service
            .batch_index("django", vec![document("1"), document("2"), document("3")])
            .await
            .unwrap();

        assert_eq!(result.total, 3);
        assert_eq!(result.succeeded, 3);
        assert_eq!(result.failed, 0);
    }

    #[tokio::test]
    async fn test_batch_size_exceeded() {
        let provider = Arc::new(MockProvider::default());
        let config = SearchIndexServiceConfig::with_max_batch_size(2);
        let service = SearchIndexService::with_config(provider.clone(), config);

        let result = service
            .batch_index("django", vec![document("1"), document("2"), document("3")])
            .await;

        assert!(matches!(
            result,
            Err(SearchIndexError::BatchSizeExceeded {
                provided: 3,
                max: 2
            })
        ));
        assert_eq!(*provider.bulk_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_size_unlimited() {
        let provider = Arc::new(MockProvider::default());
        let service =
            SearchIndexService::with_config(provider, SearchIndexServiceConfig::unlimited());

        let documents: Vec<SearchDocument> =
            (0..5000).map(|i| document(&i.to_string())).collect();

        let result = service.batch_index("django", documents).await.unwrap();
        assert_eq!(result.total, 5000);
        assert_eq!(service.max_batch_size(), None);
    }
}
