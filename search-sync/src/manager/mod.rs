//! Per-model index manager.
//!
//! Each indexable model gets one `IndexManager`. Lifecycle handlers call it to
//! index or delete single records, and to create the model's index and
//! reindex every record after a migration.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info, instrument, warn};

use crate::model::{Indexable, IndexableClass};
use crate::serializer::DocumentSerializer;
use search_sync_repository::opensearch::index_body;
use search_sync_repository::{
    BatchOperationSummary, CreateIndexRequest, DeleteDocumentRequest, IndexDocumentRequest,
    SearchIndexError, SearchIndexService,
};
use search_sync_shared::{ResolvedIndexOptions, SearchDocument};

/// Configuration for index managers.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Number of documents sent per bulk request when reindexing.
    pub bulk_size: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self { bulk_size: 100 }
    }
}

/// Index operations for one model.
pub struct IndexManager {
    service: Arc<SearchIndexService>,
    options: ResolvedIndexOptions,
    serializer: Arc<dyn DocumentSerializer>,
    config: ManagerConfig,
}

impl IndexManager {
    /// Create a manager for a model with resolved options.
    pub fn new(
        service: Arc<SearchIndexService>,
        options: ResolvedIndexOptions,
        serializer: Arc<dyn DocumentSerializer>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            service,
            options,
            serializer,
            config,
        }
    }

    /// The resolved index options of the managed model.
    pub fn options(&self) -> &ResolvedIndexOptions {
        &self.options
    }

    /// Serialize a record and write it to the index.
    #[instrument(skip(self, record), fields(model = %self.options.model_name))]
    pub async fn do_index(&self, record: &dyn Indexable) -> Result<(), SearchIndexError> {
        let document = self.serializer.serialize(&self.options, record)?;
        let doc_id = document.document_id();

        self.service
            .index(IndexDocumentRequest {
                index: self.options.index.clone(),
                document,
            })
            .await?;

        debug!(index = %self.options.index, doc_id = %doc_id, "Record indexed");
        Ok(())
    }

    /// Remove a record's document from the index.
    #[instrument(skip(self, record), fields(model = %self.options.model_name))]
    pub async fn delete(&self, record: &dyn Indexable) -> Result<(), SearchIndexError> {
        let request = DeleteDocumentRequest {
            index: self.options.index.clone(),
            doc_type: self.options.doc_type.clone(),
            record_id: record.record_id(),
        };
        let doc_id = request.document_id();

        self.service.delete(request).await?;

        debug!(index = %self.options.index, doc_id = %doc_id, "Record removed from index");
        Ok(())
    }

    /// Create the model's index, or merge its mapping into an existing one.
    #[instrument(skip(self), fields(model = %self.options.model_name))]
    pub async fn create_index(&self) -> Result<(), SearchIndexError> {
        self.service
            .ensure_index(CreateIndexRequest {
                index: self.options.index.clone(),
                body: index_body(&self.options),
            })
            .await
    }

    /// Index every record of the model in bulk.
    ///
    /// Records are streamed and sent in chunks of `bulk_size`. Per-document
    /// failures are logged and reported in the returned summary; a failing
    /// record source or bulk request aborts the reindex.
    #[instrument(skip(self, class), fields(model = %self.options.model_name))]
    pub async fn reindex_all(
        &self,
        class: &dyn IndexableClass,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let chunk_size = self.chunk_size();
        let mut chunks = class.records().chunks(chunk_size);
        let mut summary = BatchOperationSummary::empty();

        while let Some(chunk) = chunks.next().await {
            let documents = chunk
                .into_iter()
                .map(|record| {
                    let record = record?;
                    self.serializer.serialize(&self.options, record.as_ref())
                })
                .collect::<Result<Vec<SearchDocument>, SearchIndexError>>()?;

            let count = documents.len();
            debug!(count = count, "Flushing documents to search index");

            let chunk_summary = match self.service.batch_index(&self.options.index, documents).await
            {
                Ok(chunk_summary) => chunk_summary,
                Err(e) => {
                    error!(error = %e, count = count, "Failed to bulk index documents");
                    return Err(e);
                }
            };

            if chunk_summary.failed > 0 {
                warn!(
                    succeeded = chunk_summary.succeeded,
                    failed = chunk_summary.failed,
                    "Bulk index completed with some failures"
                );
                for result in chunk_summary.failures() {
                    if let Some(ref err) = result.error {
                        error!(
                            doc_id = %result.document_id,
                            error = %err,
                            "Failed to index document"
                        );
                    }
                }
            }

            summary.merge(chunk_summary);
        }

        info!(
            index = %self.options.index,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Reindex completed"
        );
        Ok(summary)
    }

    /// Bulk chunk size, capped by the service's batch limit.
    fn chunk_size(&self) -> usize {
        let size = self.config.bulk_size.max(1);
        match self.service.max_batch_size() {
            Some(max) => size.min(max.max(1)),
            None => size,
        }
    }
}
