//! OpenSearch index settings and mappings.
//!
//! Every synchronized model gets the same small base mapping. Models can add
//! their own properties, which are merged over the base.

use serde_json::{json, Map, Value};

use search_sync_shared::types::search_document::{DOC_TYPE_FIELD, INDEXED_AT_FIELD};
use search_sync_shared::ResolvedIndexOptions;

/// Suffix of the completion sub-field generated for each completion field.
pub const COMPLETION_SUFFIX: &str = "_complete";

/// Name of the completion field generated for `field`.
pub fn completion_field_name(field: &str) -> String {
    format!("{}{}", field, COMPLETION_SUFFIX)
}

/// Mapping properties for a model.
///
/// Contains:
/// - `doc_type` as keyword and `indexed_at` as date
/// - a `completion` property for every completion field
/// - the model's own mapping, either a bare properties object or
///   `{ "properties": { ... } }`
pub fn mapping_properties(options: &ResolvedIndexOptions) -> Map<String, Value> {
    let mut properties = base_properties();

    for field in &options.completion_fields {
        properties.insert(
            completion_field_name(field),
            json!({ "type": "completion" }),
        );
    }

    if let Some(mapping) = &options.mapping {
        let custom = mapping
            .get("properties")
            .and_then(Value::as_object)
            .or_else(|| mapping.as_object());
        if let Some(custom) = custom {
            for (key, value) in custom {
                properties.insert(key.clone(), value.clone());
            }
        }
    }

    properties
}

fn base_properties() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(DOC_TYPE_FIELD.to_string(), json!({ "type": "keyword" }));
    properties.insert(INDEXED_AT_FIELD.to_string(), json!({ "type": "date" }));
    properties
}

/// Settings and mappings body used to create the model's index.
///
/// # Sharding Configuration
///
/// - 1 primary shard
/// - 1 replica for redundancy
pub fn index_body(options: &ResolvedIndexOptions) -> Value {
    body_with(mapping_properties(options))
}

/// Body for an index that no model has claimed yet, carrying only the base
/// mapping.
pub fn base_index_body() -> Value {
    body_with(base_properties())
}

fn body_with(properties: Map<String, Value>) -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": properties
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_sync_shared::IndexOptions;

    #[test]
    fn test_index_body_structure() {
        let options = IndexOptions::default().resolve("Article", "django");
        let body = index_body(&options);

        assert_eq!(body["settings"]["number_of_shards"], 1);
        assert_eq!(body["settings"]["number_of_replicas"], 1);
        assert_eq!(
            body["mappings"]["properties"]["doc_type"]["type"],
            "keyword"
        );
        assert_eq!(body["mappings"]["properties"]["indexed_at"]["type"], "date");
    }

    #[test]
    fn test_completion_fields_mapped() {
        let options = IndexOptions::default()
            .with_completion_fields(["title"])
            .resolve("Article", "django");

        let properties = mapping_properties(&options);

        assert_eq!(properties["title_complete"]["type"], "completion");
    }

    #[test]
    fn test_custom_mapping_bare_properties() {
        let options = IndexOptions::default()
            .with_mapping(json!({ "title": { "type": "text" } }))
            .resolve("Article", "django");

        let properties = mapping_properties(&options);

        assert_eq!(properties["title"]["type"], "text");
        assert_eq!(properties["doc_type"]["type"], "keyword");
    }

    #[test]
    fn test_custom_mapping_wrapped_properties_override_base() {
        let options = IndexOptions::default()
            .with_mapping(json!({
                "properties": {
                    "indexed_at": { "type": "date", "format": "strict_date_time" },
                    "price": { "type": "float" }
                }
            }))
            .resolve("Product", "django");

        let properties = mapping_properties(&options);

        assert_eq!(properties["price"]["type"], "float");
        assert_eq!(properties["indexed_at"]["format"], "strict_date_time");
        assert!(!properties.contains_key("properties"));
    }

    #[test]
    fn test_base_index_body_has_only_base_mapping() {
        let body = base_index_body();
        let properties = body["mappings"]["properties"].as_object().unwrap();

        assert_eq!(properties.len(), 2);
        assert_eq!(body["settings"]["number_of_shards"], 1);
    }
}
