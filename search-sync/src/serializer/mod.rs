//! Conversion of records into search documents.

use serde_json::{json, Map, Value};

use crate::model::Indexable;
use search_sync_repository::opensearch::completion_field_name;
use search_sync_repository::SearchIndexError;
use search_sync_shared::{ResolvedIndexOptions, SearchDocument};

/// Turns an indexable record into the document written to the index.
pub trait DocumentSerializer: Send + Sync {
    /// Serialize one record according to its model's index options.
    fn serialize(
        &self,
        options: &ResolvedIndexOptions,
        record: &dyn Indexable,
    ) -> Result<SearchDocument, SearchIndexError>;
}

/// Default serializer: indexes the record's own field map.
///
/// - keeps only `fields` when the model restricts them
/// - drops `unindexable_fields`
/// - adds a `{field}_complete` entry for each string-valued completion field
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDocumentSerializer;

impl DocumentSerializer for JsonDocumentSerializer {
    fn serialize(
        &self,
        options: &ResolvedIndexOptions,
        record: &dyn Indexable,
    ) -> Result<SearchDocument, SearchIndexError> {
        let mut source = record.fields()?;

        if let Some(allowed) = &options.fields {
            source.retain(|key, _| allowed.iter().any(|f| f == key));
        }

        for field in &options.unindexable_fields {
            source.remove(field);
        }

        let completions: Map<String, Value> = options
            .completion_fields
            .iter()
            .filter_map(|field| match source.get(field) {
                Some(Value::String(input)) => Some((
                    completion_field_name(field),
                    json!({ "input": [input] }),
                )),
                _ => None,
            })
            .collect();
        source.extend(completions);

        Ok(SearchDocument::new(
            options.doc_type.clone(),
            record.record_id(),
            source,
        ))
    }
}
