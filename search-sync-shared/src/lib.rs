//! # Search Sync Shared
//!
//! This crate defines shared data structures used across the search sync crates.
//! It includes the per-model index options and the document shape written to the index.

pub mod types;

pub use types::index_options::{IndexOptions, ResolvedIndexOptions};
pub use types::search_document::SearchDocument;
