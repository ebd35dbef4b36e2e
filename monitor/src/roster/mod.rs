//! Machine roster: the ordered set of known machines
//!
//! Snapshots are immutable. Every reconciled event produces a new
//! [`RosterSnapshot`] with a higher version, published by [`store::RosterStore`].

pub mod normalize;
pub mod reconcile;
pub mod seed;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::MachineStatus;

/// One monitored machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    /// Identity key, unique within a roster
    pub key: String,
    pub name: String,
    pub status: MachineStatus,
    pub location: Option<String>,
    pub factory_id: Option<u32>,
    pub error: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

impl Machine {
    /// Placeholder entry awaiting its first status event
    pub fn placeholder(key: &str, name: &str, factory_id: u32, location: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            status: MachineStatus::Offline,
            location: Some(location.to_string()),
            factory_id: Some(factory_id),
            error: None,
            last_update: None,
        }
    }
}

/// What happens to the roster when a fresh session starts after a disconnect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectPolicy {
    /// Keep every entry and its last known status
    #[default]
    Preserve,

    /// Reset the roster to the seed
    Reseed,
}

/// Immutable, versioned view of the roster
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterSnapshot {
    pub version: u64,
    pub machines: Vec<Machine>,
}

impl RosterSnapshot {
    pub fn new(machines: Vec<Machine>) -> Self {
        Self {
            version: 0,
            machines,
        }
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Find a machine by identity key
    pub fn get(&self, key: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.key == key)
    }
}
