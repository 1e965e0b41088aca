//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesPutMappingParts},
    BulkParts, DeleteParts, IndexParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::{
    BatchOperationResult, BatchOperationSummary, CreateIndexRequest, DeleteDocumentRequest,
    IndexDocumentRequest,
};
use search_sync_shared::SearchDocument;

/// Error type OpenSearch returns when creating an index that already exists.
const ALREADY_EXISTS_ERROR: &str = "resource_already_exists_exception";

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// let provider = OpenSearchProvider::new("http://localhost:9200", None).await?;
/// provider.ping().await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider for the specified URL.
    ///
    /// No request is sent; use `ping` to check connectivity.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `request_timeout` - Optional timeout applied to every request
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or the transport cannot be built
    pub async fn new(
        url: &str,
        request_timeout: Option<Duration>,
    ) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let transport = builder
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            request_timeout_ms = request_timeout.map(|t| t.as_millis() as u64),
            "Created OpenSearch provider"
        );

        Ok(Self { client })
    }

    /// Read the body of an unsuccessful response for error reporting.
    async fn error_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    /// Whether the index already exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(SearchIndexError::index_creation(format!(
                "Index existence check for '{}' returned status {}",
                index, status
            ))),
        }
    }

    /// Merge mapping properties into an existing index.
    async fn put_mapping(&self, index: &str, body: &Value) -> Result<(), SearchIndexError> {
        let Some(properties) = body.get("mappings").and_then(|m| m.get("properties")) else {
            return Ok(());
        };

        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[index]))
            .body(json!({ "properties": properties }))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(index = %index, status = %status, body = %error_body, "Put mapping request failed");
            return Err(SearchIndexError::index_creation(format!(
                "Put mapping failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, "Index mapping updated");
        Ok(())
    }

    /// Build the newline-delimited bulk body for a set of documents.
    fn bulk_body(index: &str, documents: &[SearchDocument]) -> Vec<JsonBody<Value>> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for doc in documents {
            body.push(json!({"index": {"_index": index, "_id": doc.document_id()}}).into());
            body.push(doc.to_body().into());
        }
        body
    }

    /// Turn a bulk response into a per-document summary.
    ///
    /// Items are matched to documents by position. A document with no matching
    /// item is reported as failed.
    fn summarize_bulk_response(
        documents: &[SearchDocument],
        response_body: &Value,
    ) -> BatchOperationSummary {
        let empty = Vec::new();
        let items = response_body
            .get("items")
            .and_then(Value::as_array)
            .unwrap_or(&empty);

        let results = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let document_id = doc.document_id();
                let item = items.get(i).and_then(|item| item.get("index"));
                let error = match item {
                    None => Some(SearchIndexError::parse(
                        "Missing item in bulk response".to_string(),
                    )),
                    Some(item) => item
                        .get("error")
                        .map(|e| SearchIndexError::index(e.to_string())),
                };
                BatchOperationResult {
                    document_id,
                    success: error.is_none(),
                    error,
                }
            })
            .collect();

        BatchOperationSummary::from_results(results)
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn ping(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchIndexError::connection(format!(
                "Ping returned status {}",
                status
            )));
        }

        Ok(())
    }

    async fn create_index(&self, request: &CreateIndexRequest) -> Result<(), SearchIndexError> {
        if self.index_exists(&request.index).await? {
            debug!(index = %request.index, "Index already exists, merging mapping");
            return self.put_mapping(&request.index, &request.body).await;
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&request.index))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            if error_body.contains(ALREADY_EXISTS_ERROR) {
                // Created concurrently between the existence check and the create call.
                warn!(index = %request.index, "Index was created concurrently");
                return self.put_mapping(&request.index, &request.body).await;
            }
            error!(status = %status, body = %error_body, "Create index request failed");
            return Err(SearchIndexError::index_creation(format!(
                "Create index failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %request.index, "Index created");
        Ok(())
    }

    async fn index_document(&self, request: &IndexDocumentRequest) -> Result<(), SearchIndexError> {
        let doc_id = request.document.document_id();

        let response = self
            .client
            .index(IndexParts::IndexId(&request.index, &doc_id))
            .body(request.document.to_body())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(SearchIndexError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %request.index, doc_id = %doc_id, "Document indexed");
        Ok(())
    }

    async fn delete_document(
        &self,
        request: &DeleteDocumentRequest,
    ) -> Result<(), SearchIndexError> {
        let doc_id = request.document_id();

        let response = self
            .client
            .delete(DeleteParts::IndexId(&request.index, &doc_id))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %request.index, doc_id = %doc_id, "Document deleted");
        Ok(())
    }

    async fn bulk_index_documents(
        &self,
        index: &str,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(Self::bulk_body(index, documents))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::bulk_index(format!(
                "Bulk index failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = Self::summarize_bulk_response(documents, &response_body);
        debug!(
            index = %index,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk index completed"
        );
        Ok(summary)
    }
}
