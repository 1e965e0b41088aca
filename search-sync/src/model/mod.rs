//! Model and record abstractions of the system of record.
//!
//! The object layer describes its model classes with [`ModelClass`] and its
//! persisted instances with [`Record`]. A model opts into search sync by
//! returning `Some` from [`ModelClass::indexable`], and its instances by returning
//! `Some` from [`Record::as_indexable`].

use std::sync::Arc;

use futures::stream::BoxStream;
use serde_json::{Map, Value};

use crate::errors::SyncError;
use crate::serializer::DocumentSerializer;
use search_sync_repository::SearchIndexError;
use search_sync_shared::IndexOptions;

/// Stream of all records of an indexable model, used for reindexing.
pub type RecordStream<'a> = BoxStream<'a, Result<Arc<dyn Indexable>, SearchIndexError>>;

/// A persisted instance of some model.
pub trait Record: Send + Sync {
    /// Name of the model this record belongs to.
    fn model_name(&self) -> &str;

    /// The indexable view of this record, `None` if the model is not indexed.
    fn as_indexable(&self) -> Option<&dyn Indexable> {
        None
    }
}

/// A record whose content is mirrored into the search index.
pub trait Indexable: Send + Sync {
    /// Primary key of the record.
    fn record_id(&self) -> String;

    /// Field values to index.
    fn fields(&self) -> Result<Map<String, Value>, SearchIndexError>;

    /// True for instances rebuilt from a search hit rather than loaded from
    /// the system of record.
    fn is_search_deserialized(&self) -> bool {
        false
    }
}

/// A model class of the system of record.
pub trait ModelClass: Send + Sync {
    /// Name of the model.
    fn model_name(&self) -> &str;

    /// The indexable view of this model, `None` if it is not indexed.
    fn indexable(&self) -> Option<&dyn IndexableClass> {
        None
    }
}

/// A model class whose records are mirrored into the search index.
pub trait IndexableClass: Send + Sync {
    /// Indexing options of the model.
    fn index_options(&self) -> IndexOptions {
        IndexOptions::default()
    }

    /// Serializer overriding the registry default.
    fn serializer(&self) -> Option<Arc<dyn DocumentSerializer>> {
        None
    }

    /// All records of the model.
    fn records(&self) -> RecordStream<'_>;
}

/// Reject writes of records that were rebuilt from a search hit.
///
/// Such instances only carry the indexed fields, so saving or deleting them
/// would corrupt the system of record.
pub fn ensure_persistable(record: &dyn Record) -> Result<(), SyncError> {
    match record.as_indexable() {
        Some(indexable) if indexable.is_search_deserialized() => Err(
            SyncError::deserialized_record(record.model_name(), indexable.record_id()),
        ),
        _ => Ok(()),
    }
}
