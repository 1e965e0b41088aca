//! Error types for the sync layer.

use thiserror::Error;

use search_sync_repository::SearchIndexError;

/// Errors raised while mirroring record lifecycle events into the search index.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Error from the search backend that was not swallowed as "unavailable".
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),

    /// Error from the system of record.
    #[error("Store error: {0}")]
    StoreError(String),

    /// The record was rebuilt from a search hit and must not be written back.
    #[error("Record {record_id} of {model} was deserialized from a search source and cannot be saved or deleted")]
    DeserializedRecord { model: String, record_id: String },

    /// An indexable model received an event before it was prepared.
    #[error("Model {0} has no index manager; it was never prepared")]
    UnpreparedModel(String),
}

impl SyncError {
    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    /// Create a deserialized record error.
    pub fn deserialized_record(model: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self::DeserializedRecord {
            model: model.into(),
            record_id: record_id.into(),
        }
    }

    /// Create an unprepared model error.
    pub fn unprepared_model(model: impl Into<String>) -> Self {
        Self::UnpreparedModel(model.into())
    }
}
