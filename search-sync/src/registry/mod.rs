//! Registry of index managers, one per indexable model.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::errors::SyncError;
use crate::manager::{IndexManager, ManagerConfig};
use crate::model::ModelClass;
use crate::serializer::{DocumentSerializer, JsonDocumentSerializer};
use crate::signals::{ModelPrepared, Receiver};
use search_sync_repository::SearchIndexService;

/// Attaches an `IndexManager` to every indexable model when it is prepared.
pub struct ModelRegistry {
    service: Arc<SearchIndexService>,
    default_index: String,
    serializer: Arc<dyn DocumentSerializer>,
    manager_config: ManagerConfig,
    managers: RwLock<HashMap<String, Arc<IndexManager>>>,
}

impl ModelRegistry {
    /// Create a registry using the default JSON serializer.
    pub fn new(
        service: Arc<SearchIndexService>,
        default_index: impl Into<String>,
        manager_config: ManagerConfig,
    ) -> Self {
        Self::with_serializer(
            service,
            default_index,
            manager_config,
            Arc::new(JsonDocumentSerializer),
        )
    }

    /// Create a registry with a custom default serializer.
    pub fn with_serializer(
        service: Arc<SearchIndexService>,
        default_index: impl Into<String>,
        manager_config: ManagerConfig,
        serializer: Arc<dyn DocumentSerializer>,
    ) -> Self {
        Self {
            service,
            default_index: default_index.into(),
            serializer,
            manager_config,
            managers: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a manager to the model if it is indexable.
    ///
    /// Preparing a model again replaces its manager. Returns whether a manager
    /// was attached.
    pub fn prepare(&self, class: &dyn ModelClass) -> bool {
        let Some(indexable) = class.indexable() else {
            debug!(model = %class.model_name(), "Model is not indexable, skipping");
            return false;
        };

        let options = indexable
            .index_options()
            .resolve(class.model_name(), &self.default_index);
        let serializer = indexable
            .serializer()
            .unwrap_or_else(|| Arc::clone(&self.serializer));

        info!(
            model = %class.model_name(),
            index = %options.index,
            doc_type = %options.doc_type,
            "Attaching index manager"
        );

        let manager = Arc::new(IndexManager::new(
            Arc::clone(&self.service),
            options,
            serializer,
            self.manager_config.clone(),
        ));

        let previous = self
            .managers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(class.model_name().to_string(), Arc::clone(&manager));

        // Keyed by bare model name: a same-named model from another app
        // replaces the entry.
        if let Some(previous) = previous.filter(|p| p.options() != manager.options()) {
            warn!(
                model = %class.model_name(),
                previous_index = %previous.options().index,
                previous_doc_type = %previous.options().doc_type,
                index = %manager.options().index,
                doc_type = %manager.options().doc_type,
                "Replacing index manager of a model with the same name"
            );
        }
        true
    }

    /// The manager attached to a model.
    pub fn manager(&self, model_name: &str) -> Option<Arc<IndexManager>> {
        self.managers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(model_name)
            .cloned()
    }

    /// The manager attached to a model, or an error if it was never prepared.
    pub fn require_manager(&self, model_name: &str) -> Result<Arc<IndexManager>, SyncError> {
        self.manager(model_name)
            .ok_or_else(|| SyncError::unprepared_model(model_name))
    }

    /// Names of all models with a manager.
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .managers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl Receiver<ModelPrepared> for ModelRegistry {
    async fn receive(&self, event: &ModelPrepared) -> Result<(), SyncError> {
        self.prepare(event.class.as_ref());
        Ok(())
    }
}
