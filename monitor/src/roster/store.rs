//! Roster snapshot store

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::errors::MonitorError;
use crate::roster::normalize::{normalize, StatusUpdate};
use crate::roster::reconcile::{reconcile, ReconcileOptions};
use crate::roster::{Machine, RosterSnapshot};

/// Holds the current roster snapshot and publishes replacements
///
/// The snapshot is swapped as a whole, so readers holding an `Arc` always
/// see a complete roster.
pub struct RosterStore {
    tx: watch::Sender<Arc<RosterSnapshot>>,
    options: ReconcileOptions,
}

impl RosterStore {
    /// Create a store with an initial roster
    pub fn new(initial: Vec<Machine>, options: ReconcileOptions) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(RosterSnapshot::new(initial)));
        Self { tx, options }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<RosterSnapshot> {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot replacements
    pub fn subscribe(&self) -> watch::Receiver<Arc<RosterSnapshot>> {
        self.tx.subscribe()
    }

    /// Merge a normalized update, stamping it with the current time
    pub fn apply(&self, update: &StatusUpdate) -> Arc<RosterSnapshot> {
        self.apply_at(update, Utc::now())
    }

    /// Merge a normalized update
    pub fn apply_at(&self, update: &StatusUpdate, now: DateTime<Utc>) -> Arc<RosterSnapshot> {
        let mut next = None;
        self.tx.send_modify(|current| {
            let replaced = Arc::new(reconcile(current, update, now, &self.options));
            next = Some(replaced.clone());
            *current = replaced;
        });
        let next = next.unwrap_or_else(|| self.snapshot());
        debug!("Roster updated to version {} ({} machines)", next.version, next.len());
        next
    }

    /// Normalize and merge a raw status payload
    ///
    /// A malformed payload leaves the roster untouched.
    pub fn apply_payload(&self, raw: &Value) -> Result<Arc<RosterSnapshot>, MonitorError> {
        let update = normalize(raw)?;
        Ok(self.apply(&update))
    }

    /// Replace the roster contents
    pub fn reset(&self, machines: Vec<Machine>) -> Arc<RosterSnapshot> {
        let mut next = None;
        self.tx.send_modify(|current| {
            let replaced = Arc::new(RosterSnapshot {
                version: current.version + 1,
                machines,
            });
            next = Some(replaced.clone());
            *current = replaced;
        });
        next.unwrap_or_else(|| self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::MachineStatus;
    use serde_json::json;

    #[test]
    fn test_apply_payload_replaces_snapshot() {
        let store = RosterStore::new(Vec::new(), ReconcileOptions::default());
        let before = store.snapshot();

        store
            .apply_payload(&json!({"machine": "CNC-01", "status": "running"}))
            .unwrap();

        let after = store.snapshot();
        assert!(before.is_empty());
        assert_eq!(after.version, 1);
        assert_eq!(after.get("CNC-01").unwrap().status, MachineStatus::Operational);
    }

    #[test]
    fn test_malformed_payload_keeps_roster() {
        let store = RosterStore::new(Vec::new(), ReconcileOptions::default());
        store.apply_payload(&json!({"machine": "A"})).unwrap();

        assert!(store.apply_payload(&json!("{broken")).is_err());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_replacements() {
        let store = RosterStore::new(Vec::new(), ReconcileOptions::default());
        let mut rx = store.subscribe();

        store.apply_payload(&json!({"machine": "A", "status": 5})).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().version, 1);

        store.reset(Vec::new());
        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.version, 2);
        assert!(snapshot.is_empty());
    }
}
