//! Lifecycle signals of the system of record.
//!
//! A [`Signal`] delivers one kind of lifecycle event to its connected
//! receivers, in connection order. Receivers are keyed by a dispatch uid so the
//! same receiver is never connected twice.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::SyncError;
use crate::model::{ModelClass, Record};

/// A receiver of lifecycle events of type `E`.
#[async_trait]
pub trait Receiver<E: Sync>: Send + Sync {
    /// Handle one event.
    async fn receive(&self, event: &E) -> Result<(), SyncError>;
}

/// A model class finished loading.
pub struct ModelPrepared {
    pub class: Arc<dyn ModelClass>,
}

/// A record was written to the system of record.
pub struct RecordSaved {
    pub sender: Arc<dyn ModelClass>,
    pub instance: Arc<dyn Record>,
    /// True when the record was inserted rather than updated.
    pub created: bool,
}

/// A record was removed from the system of record.
pub struct RecordDeleted {
    pub sender: Arc<dyn ModelClass>,
    pub instance: Arc<dyn Record>,
}

/// The schema of an application was migrated.
pub struct Migrated {
    pub app_label: String,
    pub models: Vec<Arc<dyn ModelClass>>,
}

type Connection<E> = (String, Arc<dyn Receiver<E>>);

/// An ordered set of receivers for one kind of event.
pub struct Signal<E: Sync> {
    name: &'static str,
    receivers: RwLock<Vec<Connection<E>>>,
}

impl<E: Sync> Signal<E> {
    /// Create a signal with no receivers.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            receivers: RwLock::new(Vec::new()),
        }
    }

    /// Connect a receiver under `dispatch_uid`.
    ///
    /// Returns `false` and leaves the signal unchanged if a receiver is already
    /// connected under that uid.
    pub fn connect(&self, dispatch_uid: impl Into<String>, receiver: Arc<dyn Receiver<E>>) -> bool {
        let dispatch_uid = dispatch_uid.into();
        let mut receivers = self.receivers.write().unwrap_or_else(|e| e.into_inner());

        if receivers.iter().any(|(uid, _)| *uid == dispatch_uid) {
            return false;
        }

        debug!(signal = self.name, dispatch_uid = %dispatch_uid, "Receiver connected");
        receivers.push((dispatch_uid, receiver));
        true
    }

    /// Disconnect the receiver connected under `dispatch_uid`.
    pub fn disconnect(&self, dispatch_uid: &str) -> bool {
        let mut receivers = self.receivers.write().unwrap_or_else(|e| e.into_inner());
        let before = receivers.len();
        receivers.retain(|(uid, _)| uid != dispatch_uid);
        receivers.len() != before
    }

    /// Number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Deliver an event to every receiver in connection order.
    ///
    /// Stops at the first receiver error and returns it.
    pub async fn send(&self, event: &E) -> Result<(), SyncError> {
        // Snapshot so no lock is held across await points.
        let receivers: Vec<Arc<dyn Receiver<E>>> = self
            .receivers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, receiver)| Arc::clone(receiver))
            .collect();

        for receiver in receivers {
            receiver.receive(event).await?;
        }
        Ok(())
    }
}

/// The lifecycle signals of one system of record.
pub struct Signals {
    pub class_prepared: Signal<ModelPrepared>,
    pub post_save: Signal<RecordSaved>,
    pub post_delete: Signal<RecordDeleted>,
    pub post_migrate: Signal<Migrated>,
}

impl Signals {
    pub fn new() -> Self {
        Self {
            class_prepared: Signal::new("class_prepared"),
            post_save: Signal::new("post_save"),
            post_delete: Signal::new("post_delete"),
            post_migrate: Signal::new("post_migrate"),
        }
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Receiver<String> for Recorder {
        async fn receive(&self, event: &String) -> Result<(), SyncError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.label, event));
            if self.fail {
                return Err(SyncError::store("receiver failed"));
            }
            Ok(())
        }
    }

    fn recorder(label: &'static str, log: &Arc<Mutex<Vec<String>>>, fail: bool) -> Arc<Recorder> {
        Arc::new(Recorder {
            label,
            log: Arc::clone(log),
            fail,
        })
    }

    #[tokio::test]
    async fn test_send_in_connection_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal: Signal<String> = Signal::new("test");

        signal.connect("first", recorder("first", &log, false));
        signal.connect("second", recorder("second", &log, false));

        signal.send(&"saved".to_string()).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:saved".to_string(), "second:saved".to_string()]
        );
    }

    #[tokio::test]
    async fn test_duplicate_uid_not_connected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal: Signal<String> = Signal::new("test");

        assert!(signal.connect("sync", recorder("a", &log, false)));
        assert!(!signal.connect("sync", recorder("b", &log, false)));
        assert_eq!(signal.receiver_count(), 1);

        signal.send(&"e".to_string()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a:e".to_string()]);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal: Signal<String> = Signal::new("test");
        signal.connect("sync", recorder("a", &log, false));

        assert!(signal.disconnect("sync"));
        assert!(!signal.disconnect("sync"));

        signal.send(&"e".to_string()).await.unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_error_stops_delivery() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal: Signal<String> = Signal::new("test");

        signal.connect("failing", recorder("failing", &log, true));
        signal.connect("after", recorder("after", &log, false));

        let result = signal.send(&"e".to_string()).await;

        assert!(matches!(result, Err(SyncError::StoreError(_))));
        assert_eq!(*log.lock().unwrap(), vec!["failing:e".to_string()]);
    }

    #[test]
    fn test_new_signals_have_no_receivers() {
        let signals = Signals::default();
        assert_eq!(signals.class_prepared.receiver_count(), 0);
        assert_eq!(signals.post_save.receiver_count(), 0);
        assert_eq!(signals.post_delete.receiver_count(), 0);
        assert_eq!(signals.post_migrate.receiver_count(), 0);
    }
}
