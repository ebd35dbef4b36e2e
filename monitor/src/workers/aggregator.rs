//! Aggregator worker: rebuilds derived views whenever the roster changes

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::aggregate::publisher::DashboardPublisher;
use crate::roster::RosterSnapshot;

/// Run the aggregator worker
pub async fn run(
    publisher: &DashboardPublisher,
    mut roster_rx: watch::Receiver<Arc<RosterSnapshot>>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Aggregator worker starting...");

    let initial = roster_rx.borrow_and_update().clone();
    publisher.refresh(&initial, Utc::now());

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Aggregator worker shutting down...");
                return;
            }
            changed = roster_rx.changed() => {
                if changed.is_err() {
                    info!("Roster store dropped, aggregator worker exiting");
                    return;
                }
                let snapshot = roster_rx.borrow_and_update().clone();
                debug!("Roster version {} received", snapshot.version);
                publisher.refresh(&snapshot, Utc::now());
            }
        }
    }
}
