//! # Search Sync Repository
//!
//! This crate provides the search backend seam used by the sync layer: the
//! `SearchIndexProvider` trait, a concrete OpenSearch implementation, request and
//! summary types, and `SearchIndexService`, which validates requests and enforces
//! batch limits before delegating to a provider.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod service;
pub mod types;
pub mod utils;

pub use config::SearchIndexServiceConfig;
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use opensearch::OpenSearchProvider;
pub use service::SearchIndexService;
pub use types::{
    BatchOperationResult, BatchOperationSummary, CreateIndexRequest, DeleteDocumentRequest,
    IndexDocumentRequest,
};
pub use utils::{validate_index_name, validate_record_id};
