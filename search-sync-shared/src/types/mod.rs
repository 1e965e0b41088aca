//! Core data structures shared by the search sync crates.

pub mod index_options;
pub mod search_document;

pub use index_options::{IndexOptions, ResolvedIndexOptions};
pub use search_document::SearchDocument;
