//! Lifecycle handlers that mirror record changes into the search index.
//!
//! Every handler probes the backend before touching the index. When the probe
//! or the index operation fails because the backend is unreachable or too slow,
//! the failure is logged and the operation is dropped. There is no retry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::errors::SyncError;
use crate::model::{Indexable, ModelClass, Record};
use crate::registry::ModelRegistry;
use crate::signals::{Migrated, ModelPrepared, Receiver, RecordDeleted, RecordSaved, Signals};
use search_sync_repository::{SearchIndexError, SearchIndexService};

/// Dispatch uids under which the sync receivers are connected.
pub const SAVE_DISPATCH_UID: &str = "search_sync.on_save";
pub const DELETE_DISPATCH_UID: &str = "search_sync.on_delete";
pub const MIGRATE_DISPATCH_UID: &str = "search_sync.on_migrate";
pub const PREPARE_DISPATCH_UID: &str = "search_sync.attach_manager";

/// Callbacks for save, delete and migrate events.
pub struct SyncHandlers {
    registry: Arc<ModelRegistry>,
    service: Arc<SearchIndexService>,
    max_timeout: Option<Duration>,
}

impl SyncHandlers {
    /// Create handlers.
    ///
    /// # Arguments
    ///
    /// * `registry` - Registry holding the per-model managers
    /// * `service` - Service used for the connectivity probe
    /// * `max_timeout` - Upper bound for the probe, `None` to wait indefinitely
    pub fn new(
        registry: Arc<ModelRegistry>,
        service: Arc<SearchIndexService>,
        max_timeout: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            service,
            max_timeout,
        }
    }

    /// Check that the backend answers within the configured timeout.
    async fn probe(&self) -> Result<(), SearchIndexError> {
        match self.max_timeout {
            Some(limit) => timeout(limit, self.service.ping())
                .await
                .map_err(|_| {
                    SearchIndexError::timeout(format!(
                        "no answer within {} ms",
                        limit.as_millis()
                    ))
                })?,
            None => self.service.ping().await,
        }
    }

    /// Swallow unavailable-backend errors, propagate everything else.
    fn absorb_unavailable(
        result: Result<(), SearchIndexError>,
        model: &str,
        operation: &'static str,
    ) -> Result<(), SyncError> {
        match result {
            Err(e) if e.is_unavailable() => {
                error!(
                    model = %model,
                    operation = operation,
                    error = %e,
                    "Search backend is not responding"
                );
                Ok(())
            }
            other => other.map_err(SyncError::from),
        }
    }

    /// Index the saved record.
    pub async fn on_save(&self, event: &RecordSaved) -> Result<(), SyncError> {
        let Some(record) = Self::indexable_record(event.sender.as_ref(), event.instance.as_ref())
        else {
            return Ok(());
        };
        let model = event.sender.model_name();
        let manager = self.registry.require_manager(model)?;

        let result = async {
            self.probe().await?;
            manager.do_index(record).await
        }
        .await;

        Self::absorb_unavailable(result, model, "index")
    }

    /// Remove the deleted record from the index.
    pub async fn on_delete(&self, event: &RecordDeleted) -> Result<(), SyncError> {
        let Some(record) = Self::indexable_record(event.sender.as_ref(), event.instance.as_ref())
        else {
            return Ok(());
        };
        let model = event.sender.model_name();
        let manager = self.registry.require_manager(model)?;

        let result = async {
            self.probe().await?;
            manager.delete(record).await
        }
        .await;

        Self::absorb_unavailable(result, model, "delete")
    }

    /// Create the index of every indexable migrated model and reindex it.
    ///
    /// Each model is handled on its own: an unreachable backend for one model is
    /// logged and the remaining models are still attempted.
    pub async fn on_migrate(&self, event: &Migrated) -> Result<(), SyncError> {
        info!(
            app_label = %event.app_label,
            model_count = event.models.len(),
            "Synchronizing migrated models"
        );

        for class in &event.models {
            let Some(indexable) = class.indexable() else {
                continue;
            };
            let model = class.model_name();
            let manager = self.registry.require_manager(model)?;

            let result = async {
                self.probe().await?;
                manager.create_index().await?;
                let summary = manager.reindex_all(indexable).await?;
                debug!(
                    model = %model,
                    total = summary.total,
                    failed = summary.failed,
                    "Model reindexed"
                );
                Ok::<(), SearchIndexError>(())
            }
            .await;

            Self::absorb_unavailable(result, model, "reindex")?;
        }

        Ok(())
    }

    /// The indexable view of an event's instance, if the sender is indexable.
    fn indexable_record<'a>(
        sender: &dyn ModelClass,
        instance: &'a dyn Record,
    ) -> Option<&'a dyn Indexable> {
        sender.indexable()?;
        instance.as_indexable()
    }
}

#[async_trait]
impl Receiver<RecordSaved> for SyncHandlers {
    async fn receive(&self, event: &RecordSaved) -> Result<(), SyncError> {
        self.on_save(event).await
    }
}

#[async_trait]
impl Receiver<RecordDeleted> for SyncHandlers {
    async fn receive(&self, event: &RecordDeleted) -> Result<(), SyncError> {
        self.on_delete(event).await
    }
}

#[async_trait]
impl Receiver<Migrated> for SyncHandlers {
    async fn receive(&self, event: &Migrated) -> Result<(), SyncError> {
        self.on_migrate(event).await
    }
}

/// Wire the registry and handlers to the lifecycle signals.
///
/// The registry is always connected to `class_prepared`. The save, delete and
/// migrate handlers are only connected when `auto_index` is enabled.
pub fn install(
    signals: &Signals,
    registry: Arc<ModelRegistry>,
    handlers: Arc<SyncHandlers>,
    auto_index: bool,
) {
    signals.class_prepared.connect(
        PREPARE_DISPATCH_UID,
        registry as Arc<dyn Receiver<ModelPrepared>>,
    );

    if !auto_index {
        info!("Auto-indexing disabled, lifecycle handlers not connected");
        return;
    }

    signals.post_save.connect(
        SAVE_DISPATCH_UID,
        Arc::clone(&handlers) as Arc<dyn Receiver<RecordSaved>>,
    );
    signals.post_delete.connect(
        DELETE_DISPATCH_UID,
        Arc::clone(&handlers) as Arc<dyn Receiver<RecordDeleted>>,
    );
    signals.post_migrate.connect(
        MIGRATE_DISPATCH_UID,
        handlers as Arc<dyn Receiver<Migrated>>,
    );
    info!("Auto-indexing enabled, lifecycle handlers connected");
}
