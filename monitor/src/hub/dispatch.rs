//! Routing of hub invocations to handlers

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::errors::MonitorError;
use crate::hub::events::HubEvents;

/// Handles the arguments of one hub event
pub trait EventHandler: Send + Sync {
    fn handle(&self, arguments: &[Value]) -> Result<(), MonitorError>;
}

/// How a session came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStart {
    /// First session of the process
    Initial,

    /// Automatic reconnection after a loss
    Resumed,

    /// New session after the connection had dropped to disconnected
    AfterDisconnect,
}

/// Notified whenever a session is established
pub trait SessionObserver: Send + Sync {
    fn session_started(&self, kind: SessionStart);
}

/// Result of dispatching one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    Unknown,
    Failed,
}

/// Event dispatcher
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event name
    pub fn on(mut self, event: &str, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers
            .entry(HubEvents::key(event))
            .or_default()
            .push(handler);
        self
    }

    /// Register a session observer
    pub fn observe(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Forward an invocation to its handlers
    ///
    /// Unknown events and handler failures are logged and dropped.
    pub fn dispatch(&self, target: &str, arguments: &[Value]) -> DispatchOutcome {
        let Some(handlers) = self.handlers.get(&HubEvents::key(target)) else {
            if HubEvents::is_known(target) {
                debug!("No handler registered for hub event: {}", target);
            } else {
                warn!("Dropping unknown hub event: {}", target);
            }
            return DispatchOutcome::Unknown;
        };

        debug!("Dispatching hub event {} to {} handler(s)", target, handlers.len());

        let mut outcome = DispatchOutcome::Handled;
        for handler in handlers {
            if let Err(e) = handler.handle(arguments) {
                error!("Handler for {} failed: {}", target, e);
                outcome = DispatchOutcome::Failed;
            }
        }
        outcome
    }

    /// Tell observers a session started
    pub fn session_started(&self, kind: SessionStart) {
        for observer in &self.observers {
            observer.session_started(kind);
        }
    }
}
