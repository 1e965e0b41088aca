//! OpenSearch implementation of the search index provider.

pub mod index_config;
mod provider;

pub use index_config::{base_index_body, completion_field_name, index_body};
pub use provider::OpenSearchProvider;
