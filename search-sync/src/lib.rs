//! # Search Sync
//!
//! Mirrors changes made in a system of record into an OpenSearch index by
//! reacting to the record lifecycle.
//!
//! ## Architecture
//!
//! 1. **Signals**: the system of record announces model, save, delete and
//!    migrate events
//! 2. **Registry**: attaches an index manager to every indexable model
//! 3. **Handlers**: probe the backend and index, delete or reindex
//! 4. **Manager**: serializes records and talks to the search service
//!
//! When the backend is unreachable or slow, handlers log the failure and drop
//! the operation; the write to the system of record is never rolled back.
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`model`]: Model and record traits
//! - [`signals`]: Lifecycle signal bus
//! - [`registry`]: Per-model index managers
//! - [`serializer`]: Record to document conversion
//! - [`manager`]: Index operations for one model
//! - [`handlers`]: Lifecycle handlers and their installation
//! - [`store`]: Record store wrapper firing the signals
//! - [`errors`]: Error types for the sync layer

pub mod config;
pub mod errors;
pub mod handlers;
pub mod manager;
pub mod model;
pub mod registry;
pub mod serializer;
pub mod signals;
pub mod store;

pub use config::{Dependencies, SyncSettings};
pub use errors::SyncError;
pub use handlers::{install, SyncHandlers};
pub use manager::{IndexManager, ManagerConfig};
pub use model::{Indexable, IndexableClass, ModelClass, Record, RecordStream};
pub use registry::ModelRegistry;
pub use serializer::{DocumentSerializer, JsonDocumentSerializer};
pub use signals::{Signal, Signals};
pub use store::{ObservedStore, RecordStore};

use thiserror::Error;

/// Errors that can occur during startup.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Sync error.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
