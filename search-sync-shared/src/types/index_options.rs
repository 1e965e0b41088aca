//! Per-model indexing options.
//!
//! A model class that wants its records mirrored into the search index exposes an
//! `IndexOptions` value. Unset options fall back to defaults when the options are
//! resolved against the configured default index.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Indexing options declared by an indexable model class.
///
/// # Fields
///
/// - `index`: Target index, `None` for the configured default index
/// - `doc_type`: Document type, `None` for `model-{model_name}`
/// - `mapping`: Extra mapping properties merged over the base mapping
/// - `fields`: If set, only these record fields are indexed
/// - `unindexable_fields`: Record fields that are never indexed
/// - `completion_fields`: Fields that also get a `{field}_complete` completion entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndexOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub unindexable_fields: Vec<String>,
    #[serde(default)]
    pub completion_fields: Vec<String>,
}

/// Index options with every default filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIndexOptions {
    /// Name of the model the options belong to.
    pub model_name: String,
    /// Target index name.
    pub index: String,
    /// Document type written into every document.
    pub doc_type: String,
    pub mapping: Option<Value>,
    pub fields: Option<Vec<String>>,
    pub unindexable_fields: Vec<String>,
    pub completion_fields: Vec<String>,
}

impl IndexOptions {
    /// Set the target index.
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Set the document type.
    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Restrict indexing to the given fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Never index the given fields.
    pub fn with_unindexable_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unindexable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add completion entries for the given fields.
    pub fn with_completion_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.completion_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set extra mapping properties.
    pub fn with_mapping(mut self, mapping: Value) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Fill in defaults for a model.
    ///
    /// # Arguments
    ///
    /// * `model_name` - The model the options belong to
    /// * `default_index` - Index used when `index` is unset
    ///
    /// # Example
    ///
    /// ```
    /// use search_sync_shared::IndexOptions;
    ///
    /// let resolved = IndexOptions::default().resolve("Article", "django");
    /// assert_eq!(resolved.index, "django");
    /// assert_eq!(resolved.doc_type, "model-article");
    /// ```
    pub fn resolve(&self, model_name: &str, default_index: &str) -> ResolvedIndexOptions {
        ResolvedIndexOptions {
            model_name: model_name.to_string(),
            index: self
                .index
                .clone()
                .unwrap_or_else(|| default_index.to_string()),
            doc_type: self
                .doc_type
                .clone()
                .unwrap_or_else(|| default_doc_type(model_name)),
            mapping: self.mapping.clone(),
            fields: self.fields.clone(),
            unindexable_fields: self.unindexable_fields.clone(),
            completion_fields: self.completion_fields.clone(),
        }
    }
}

/// Default document type for a model: `model-{name}` in lower case.
pub fn default_doc_type(model_name: &str) -> String {
    format!("model-{}", model_name.to_lowercase())
}
