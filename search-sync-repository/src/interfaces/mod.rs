//! Interface definitions for the search index provider.
//!
//! The `SearchIndexProvider` trait allows swapping the search backend and
//! injecting mocks in tests.

mod search_index_provider;

pub use search_index_provider::SearchIndexProvider;
