//! Finite state machine for the hub connection

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::errors::MonitorError;

const HISTORY_CAPACITY: usize = 32;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No session, a caller may start one
    Disconnected,

    /// First connection attempt in progress
    Connecting,

    /// Session established
    Connected,

    /// Session lost, automatic reconnection in progress
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }
}

/// Connection event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Start connecting
    Start,

    /// Connection attempt succeeded
    Established,

    /// Connection attempt failed
    Failed,

    /// Session dropped unexpectedly
    Lost,

    /// Server closed the session without allowing reconnection
    Closed,

    /// Automatic reconnection succeeded
    Reconnected,

    /// Automatic reconnection exhausted its schedule
    GaveUp,

    /// Session released by the client
    Stop,
}

/// Connection FSM
#[derive(Debug, Clone)]
pub struct ConnectionFsm {
    state: ConnectionState,
}

impl ConnectionFsm {
    /// Create a new FSM in disconnected state
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
        }
    }

    /// Get current state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: ConnectionEvent) -> Result<ConnectionState, MonitorError> {
        let new_state = match (self.state, event) {
            (_, ConnectionEvent::Stop) => ConnectionState::Disconnected,

            // From Disconnected
            (ConnectionState::Disconnected, ConnectionEvent::Start) => ConnectionState::Connecting,

            // From Connecting
            (ConnectionState::Connecting, ConnectionEvent::Established) => ConnectionState::Connected,
            (ConnectionState::Connecting, ConnectionEvent::Failed) => ConnectionState::Disconnected,

            // From Connected
            (ConnectionState::Connected, ConnectionEvent::Lost) => ConnectionState::Reconnecting,
            (ConnectionState::Connected, ConnectionEvent::Closed) => ConnectionState::Disconnected,

            // From Reconnecting
            (ConnectionState::Reconnecting, ConnectionEvent::Reconnected) => ConnectionState::Connected,
            (ConnectionState::Reconnecting, ConnectionEvent::GaveUp) => ConnectionState::Disconnected,

            // Invalid transitions
            (state, event) => {
                return Err(MonitorError::TransitionError(format!(
                    "{:?} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        Ok(new_state)
    }
}

impl Default for ConnectionFsm {
    fn default() -> Self {
        Self::new()
    }
}

/// One recorded transition
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub at: DateTime<Utc>,
}

/// Shared view of the connection state
///
/// Owned by the hub worker, read by the server and CLI.
pub struct ConnectionTracker {
    endpoint: String,
    fsm: Mutex<ConnectionFsm>,
    tx: watch::Sender<ConnectionState>,
    history: Mutex<VecDeque<Transition>>,
    reconnects: AtomicU32,
}

impl ConnectionTracker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            endpoint: endpoint.into(),
            fsm: Mutex::new(ConnectionFsm::new()),
            tx,
            history: Mutex::new(VecDeque::new()),
            reconnects: AtomicU32::new(0),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Successful automatic reconnections since start
    pub fn reconnects(&self) -> u32 {
        self.reconnects.load(Ordering::SeqCst)
    }

    /// Recent transitions, oldest first
    pub fn history(&self) -> Vec<Transition> {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.iter().cloned().collect()
    }

    /// Apply an event; invalid transitions are logged and leave the state unchanged
    pub fn record(&self, event: ConnectionEvent) -> ConnectionState {
        let mut fsm = self.fsm.lock().unwrap_or_else(|e| e.into_inner());
        let from = fsm.state();

        let to = match fsm.process(event) {
            Ok(to) => to,
            Err(e) => {
                warn!("Ignoring connection event: {}", e);
                return from;
            }
        };

        if event == ConnectionEvent::Reconnected {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
        }

        if from != to {
            info!("Hub connection {} -> {}", from.as_str(), to.as_str());
            let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
            history.push_back(Transition {
                from,
                to,
                at: Utc::now(),
            });
            while history.len() > HISTORY_CAPACITY {
                history.pop_front();
            }
        }

        self.tx.send_replace(to);
        to
    }
}
