//! Record store wrapper that fires lifecycle signals.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::errors::SyncError;
use crate::model::{ensure_persistable, ModelClass, Record};
use crate::signals::{Migrated, ModelPrepared, RecordDeleted, RecordSaved, Signals};

/// The system of record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a record.
    ///
    /// Returns `true` when the record was inserted, `false` when an existing
    /// record was updated.
    async fn save(&self, record: &dyn Record) -> Result<bool, SyncError>;

    /// Remove a record.
    async fn delete(&self, record: &dyn Record) -> Result<(), SyncError>;
}

/// A record store whose writes are announced on the lifecycle signals.
pub struct ObservedStore<S> {
    inner: S,
    signals: Arc<Signals>,
}

impl<S: RecordStore> ObservedStore<S> {
    pub fn new(inner: S, signals: Arc<Signals>) -> Self {
        Self { inner, signals }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn signals(&self) -> &Arc<Signals> {
        &self.signals
    }

    /// Announce a loaded model class.
    pub async fn register(&self, class: Arc<dyn ModelClass>) -> Result<(), SyncError> {
        debug!(model = %class.model_name(), "Registering model");
        self.signals
            .class_prepared
            .send(&ModelPrepared { class })
            .await
    }

    /// Save a record, then fire `post_save`.
    ///
    /// Records rebuilt from a search hit are rejected before reaching the
    /// store.
    #[instrument(skip_all, fields(model = %sender.model_name()))]
    pub async fn save(
        &self,
        sender: Arc<dyn ModelClass>,
        instance: Arc<dyn Record>,
    ) -> Result<(), SyncError> {
        ensure_persistable(instance.as_ref())?;
        let created = self.inner.save(instance.as_ref()).await?;

        self.signals
            .post_save
            .send(&RecordSaved {
                sender,
                instance,
                created,
            })
            .await
    }

    /// Delete a record, then fire `post_delete`.
    #[instrument(skip_all, fields(model = %sender.model_name()))]
    pub async fn delete(
        &self,
        sender: Arc<dyn ModelClass>,
        instance: Arc<dyn Record>,
    ) -> Result<(), SyncError> {
        ensure_persistable(instance.as_ref())?;
        self.inner.delete(instance.as_ref()).await?;

        self.signals
            .post_delete
            .send(&RecordDeleted { sender, instance })
            .await
    }

    /// Fire `post_migrate` for the models of an application.
    #[instrument(skip(self, models), fields(model_count = models.len()))]
    pub async fn migrate(
        &self,
        app_label: &str,
        models: Vec<Arc<dyn ModelClass>>,
    ) -> Result<(), SyncError> {
        self.signals
            .post_migrate
            .send(&Migrated {
                app_label: app_label.to_string(),
                models,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Indexable;
    use crate::signals::Receiver;
    use search_sync_repository::SearchIndexError;
    use serde_json::{Map, Value};
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct SetStore {
        ids: Mutex<HashSet<String>>,
        writes: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl RecordStore for SetStore {
        async fn save(&self, record: &dyn Record) -> Result<bool, SyncError> {
            if self.fail {
                return Err(SyncError::store("disk full"));
            }
            *self.writes.lock().unwrap() += 1;
            let id = record
                .as_indexable()
                .map(|r| r.record_id())
                .unwrap_or_default();
            Ok(self.ids.lock().unwrap().insert(id))
        }

        async fn delete(&self, record: &dyn Record) -> Result<(), SyncError> {
            *self.writes.lock().unwrap() += 1;
            let id = record
                .as_indexable()
                .map(|r| r.record_id())
                .unwrap_or_default();
            self.ids.lock().unwrap().remove(&id);
            Ok(())
        }
    }

    struct Page {
        id: u32,
        from_search: bool,
    }

    impl Record for Page {
        fn model_name(&self) -> &str {
            "Page"
        }

        fn as_indexable(&self) -> Option<&dyn Indexable> {
            Some(self)
        }
    }

    impl Indexable for Page {
        fn record_id(&self) -> String {
            self.id.to_string()
        }

        fn fields(&self) -> Result<Map<String, Value>, SearchIndexError> {
            Ok(Map::new())
        }

        fn is_search_deserialized(&self) -> bool {
            self.from_search
        }
    }

    struct PageClass;

    impl ModelClass for PageClass {
        fn model_name(&self) -> &str {
            "Page"
        }
    }

    #[derive(Default)]
    struct Events {
        log: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Receiver<ModelPrepared> for Events {
        async fn receive(&self, event: &ModelPrepared) -> Result<(), SyncError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("prepared:{}", event.class.model_name()));
            Ok(())
        }
    }

    #[async_trait]
    impl Receiver<RecordSaved> for Events {
        async fn receive(&self, event: &RecordSaved) -> Result<(), SyncError> {
            self.log.lock().unwrap().push(format!("saved:{}", event.created));
            Ok(())
        }
    }

    #[async_trait]
    impl Receiver<RecordDeleted> for Events {
        async fn receive(&self, _event: &RecordDeleted) -> Result<(), SyncError> {
            self.log.lock().unwrap().push("deleted".to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl Receiver<Migrated> for Events {
        async fn receive(&self, event: &Migrated) -> Result<(), SyncError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("migrated:{}:{}", event.app_label, event.models.len()));
            Ok(())
        }
    }

    fn observed(store: SetStore) -> (ObservedStore<SetStore>, Arc<Events>) {
        let signals = Arc::new(Signals::new());
        let events = Arc::new(Events::default());
        signals.class_prepared.connect("events", events.clone());
        signals.post_save.connect("events", events.clone());
        signals.post_delete.connect("events", events.clone());
        signals.post_migrate.connect("events", events.clone());
        (ObservedStore::new(store, signals), events)
    }

    fn page(id: u32, from_search: bool) -> Arc<dyn Record> {
        Arc::new(Page { id, from_search })
    }

    #[tokio::test]
    async fn test_save_fires_post_save_with_created_flag() {
        let (store, events) = observed(SetStore::default());

        store.save(Arc::new(PageClass), page(1, false)).await.unwrap();
        store.save(Arc::new(PageClass), page(1, false)).await.unwrap();

        assert_eq!(
            *events.log.lock().unwrap(),
            vec!["saved:true".to_string(), "saved:false".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_fires_post_delete() {
        let (store, events) = observed(SetStore::default());

        store.save(Arc::new(PageClass), page(1, false)).await.unwrap();
        store.delete(Arc::new(PageClass), page(1, false)).await.unwrap();

        assert!(store.inner().ids.lock().unwrap().is_empty());
        assert_eq!(events.log.lock().unwrap().last().unwrap(), "deleted");
    }

    #[tokio::test]
    async fn test_search_deserialized_record_is_rejected() {
        let (store, events) = observed(SetStore::default());

        let saved = store.save(Arc::new(PageClass), page(1, true)).await;
        let deleted = store.delete(Arc::new(PageClass), page(1, true)).await;

        assert!(matches!(saved, Err(SyncError::DeserializedRecord { .. })));
        assert!(matches!(deleted, Err(SyncError::DeserializedRecord { .. })));
        assert_eq!(*store.inner().writes.lock().unwrap(), 0);
        assert!(events.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_skips_signal() {
        let (store, events) = observed(SetStore {
            fail: true,
            ..Default::default()
        });

        let result = store.save(Arc::new(PageClass), page(1, false)).await;

        assert!(matches!(result, Err(SyncError::StoreError(_))));
        assert!(events.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_and_migrate() {
        let (store, events) = observed(SetStore::default());

        store.register(Arc::new(PageClass)).await.unwrap();
        store
            .migrate("pages", vec![Arc::new(PageClass)])
            .await
            .unwrap();

        assert_eq!(
            *events.log.lock().unwrap(),
            vec!["prepared:Page".to_string(), "migrated:pages:1".to_string()]
        );
    }
}
