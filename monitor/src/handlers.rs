//! Hub event handlers

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::MonitorError;
use crate::hub::dispatch::{EventHandler, SessionObserver, SessionStart};
use crate::notifications::NotificationFeed;
use crate::roster::store::RosterStore;
use crate::roster::{Machine, ReconnectPolicy};

/// Applies `status` events to the roster
pub struct StatusHandler {
    store: Arc<RosterStore>,
    policy: ReconnectPolicy,
    seed: Vec<Machine>,
}

impl StatusHandler {
    pub fn new(store: Arc<RosterStore>, policy: ReconnectPolicy, seed: Vec<Machine>) -> Self {
        Self {
            store,
            policy,
            seed,
        }
    }
}

impl EventHandler for StatusHandler {
    fn handle(&self, arguments: &[Value]) -> Result<(), MonitorError> {
        if arguments.is_empty() {
            return Err(MonitorError::PayloadError(
                "status event without arguments".to_string(),
            ));
        }

        // every argument is one payload, applied in order
        let mut result = Ok(());
        for raw in arguments {
            match self.store.apply_payload(raw) {
                Ok(snapshot) => debug!("Status applied, roster version {}", snapshot.version),
                Err(e) => result = Err(e),
            }
        }
        result
    }
}

impl SessionObserver for StatusHandler {
    fn session_started(&self, kind: SessionStart) {
        if kind == SessionStart::AfterDisconnect && self.policy == ReconnectPolicy::Reseed {
            let snapshot = self.store.reset(self.seed.clone());
            info!("Roster reseeded after reconnect, version {}", snapshot.version);
        }
    }
}

/// Records notification events in the feed
pub struct NotificationHandler {
    kind: String,
    feed: Arc<NotificationFeed>,
}

impl NotificationHandler {
    pub fn new(kind: &str, feed: Arc<NotificationFeed>) -> Self {
        Self {
            kind: kind.to_string(),
            feed,
        }
    }
}

impl EventHandler for NotificationHandler {
    fn handle(&self, arguments: &[Value]) -> Result<(), MonitorError> {
        let raw = arguments.first().ok_or_else(|| {
            MonitorError::PayloadError(format!("{} event without arguments", self.kind))
        })?;
        self.feed.push_payload(&self.kind, raw, Utc::now())?;
        info!("Notification received: {}", self.kind);
        Ok(())
    }
}
