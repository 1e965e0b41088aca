//! Dependency initialization and wiring for search sync.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use super::settings::{ConnectionMode, SyncSettings};
use crate::handlers::{install, SyncHandlers};
use crate::manager::ManagerConfig;
use crate::registry::ModelRegistry;
use crate::signals::Signals;
use crate::IndexingError;
use search_sync_repository::opensearch::base_index_body;
use search_sync_repository::{
    CreateIndexRequest, OpenSearchProvider, SearchIndexProvider, SearchIndexService,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub settings: SyncSettings,
    /// Lifecycle signals with the sync receivers installed.
    pub signals: Arc<Signals>,
    pub registry: Arc<ModelRegistry>,
    pub handlers: Arc<SyncHandlers>,
    pub service: Arc<SearchIndexService>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`SyncSettings::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails (only in fail-fast mode)
    pub async fn new() -> Result<Self, IndexingError> {
        Self::connect(SyncSettings::from_env()).await
    }

    /// Connect to the backend described by `settings` and wire everything.
    pub async fn connect(settings: SyncSettings) -> Result<Self, IndexingError> {
        info!(
            url = %settings.url,
            default_index = %settings.default_index,
            max_timeout_ms = settings.max_timeout.map(|t| t.as_millis() as u64),
            auto_index = settings.auto_index,
            bulk_size = settings.bulk_size,
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            "Initializing dependencies"
        );

        let provider = Self::connect_to_opensearch(
            &settings.url,
            settings.max_timeout,
            settings.connection_mode,
            settings.retry_interval,
        )
        .await?;

        info!("OpenSearch connection established");

        Ok(Self::from_provider(settings, Arc::new(provider)))
    }

    /// Wire the sync layer over an already built provider.
    ///
    /// No request is sent.
    pub fn from_provider(settings: SyncSettings, provider: Arc<dyn SearchIndexProvider>) -> Self {
        let service = Arc::new(SearchIndexService::new(provider));
        let registry = Arc::new(ModelRegistry::new(
            Arc::clone(&service),
            settings.default_index.clone(),
            ManagerConfig {
                bulk_size: settings.bulk_size,
            },
        ));
        let handlers = Arc::new(SyncHandlers::new(
            Arc::clone(&registry),
            Arc::clone(&service),
            settings.max_timeout,
        ));

        let signals = Arc::new(Signals::new());
        install(
            &signals,
            Arc::clone(&registry),
            Arc::clone(&handlers),
            settings.auto_index,
        );

        Self {
            settings,
            signals,
            registry,
            handlers,
            service,
        }
    }

    /// Create the default index with the base mapping if it does not exist.
    pub async fn ensure_default_index(&self) -> Result<(), IndexingError> {
        self.service
            .ensure_index(CreateIndexRequest {
                index: self.settings.default_index.clone(),
                body: base_index_body(),
            })
            .await
            .map_err(|e| IndexingError::config(format!("Failed to ensure index exists: {}", e)))
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    ///
    /// A URL or transport that cannot be built fails immediately in either
    /// mode; only an unanswered ping is retried.
    async fn connect_to_opensearch(
        url: &str,
        request_timeout: Option<Duration>,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, IndexingError> {
        let provider = OpenSearchProvider::new(url, request_timeout)
            .await
            .map_err(|e| {
                IndexingError::config(format!("Failed to create OpenSearch provider: {}", e))
            })?;

        Self::wait_until_available(&provider, url, mode, retry_interval).await?;

        Ok(provider)
    }

    /// Ping the backend until it answers, or once in fail-fast mode.
    async fn wait_until_available(
        provider: &dyn SearchIndexProvider,
        url: &str,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<(), IndexingError> {
        loop {
            match provider.ping().await {
                Ok(()) => return Ok(()),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}
