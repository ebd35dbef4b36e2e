//! Publishes derived views for each roster snapshot

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use crate::aggregate::trend::{TrendHistory, TrendPoint};
use crate::aggregate::{DashboardView, FactoryDefinition};
use crate::roster::RosterSnapshot;

/// Latest [`DashboardView`] plus the operational trend
pub struct DashboardPublisher {
    factories: Vec<FactoryDefinition>,
    tx: watch::Sender<Arc<DashboardView>>,
    trend: Mutex<TrendHistory>,
}

impl DashboardPublisher {
    pub fn new(factories: Vec<FactoryDefinition>, trend_capacity: usize) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(DashboardView::default()));
        Self {
            factories,
            tx,
            trend: Mutex::new(TrendHistory::new(trend_capacity)),
        }
    }

    pub fn factories(&self) -> &[FactoryDefinition] {
        &self.factories
    }

    /// Factory by id
    pub fn factory(&self, id: u32) -> Option<&FactoryDefinition> {
        self.factories.iter().find(|f| f.id == id)
    }

    /// Latest published view
    pub fn view(&self) -> Arc<DashboardView> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardView>> {
        self.tx.subscribe()
    }

    pub fn trend(&self) -> Vec<TrendPoint> {
        self.trend
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .points()
    }

    /// Derive and publish the view of a snapshot
    ///
    /// Snapshots older than the published view are ignored.
    pub fn refresh(&self, roster: &RosterSnapshot, at: DateTime<Utc>) -> Arc<DashboardView> {
        let current = self.view();
        if roster.version < current.version {
            return current;
        }

        let view = Arc::new(DashboardView::build(roster, &self.factories));
        let recorded = self
            .trend
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record(&view.factories, at);
        debug!(
            "Dashboard view {} published (trend point added: {})",
            view.version, recorded
        );

        self.tx.send_replace(view.clone());
        view
    }
}
