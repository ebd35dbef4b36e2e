//! Merging status updates into the roster

use chrono::{DateTime, Utc};

use crate::roster::normalize::StatusUpdate;
use crate::roster::{Machine, RosterSnapshot};
use crate::status::MachineStatus;

/// Reconciler settings
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Only match an entry whose key equals the update's primary identity.
    /// Otherwise any of id/name may match any of key/name.
    pub strict_identity: bool,
}

/// Index of the roster entry an update refers to
pub fn find_match(machines: &[Machine], update: &StatusUpdate, options: &ReconcileOptions) -> Option<usize> {
    let candidates = update.identity_aliases();

    if options.strict_identity {
        let primary = candidates.first()?;
        return machines.iter().position(|m| m.key == *primary);
    }

    machines.iter().position(|m| {
        candidates
            .iter()
            .any(|candidate| m.key == *candidate || m.name == *candidate)
    })
}

/// Merge an update into a snapshot, producing the next snapshot
///
/// A matched entry keeps its position and key; present fields overwrite,
/// absent fields are preserved. Unmatched updates are appended.
pub fn reconcile(
    snapshot: &RosterSnapshot,
    update: &StatusUpdate,
    now: DateTime<Utc>,
    options: &ReconcileOptions,
) -> RosterSnapshot {
    let mut machines = snapshot.machines.clone();

    match find_match(&machines, update, options) {
        Some(index) => merge_into(&mut machines[index], update, now),
        None => {
            let machine = new_machine(update, &machines, now);
            machines.push(machine);
        }
    }

    RosterSnapshot {
        version: snapshot.version + 1,
        machines,
    }
}

fn merge_into(machine: &mut Machine, update: &StatusUpdate, now: DateTime<Utc>) {
    if let Some(name) = &update.name {
        machine.name = name.clone();
    }
    if let Some(status) = update.status {
        machine.status = status;
    }
    if let Some(location) = &update.location {
        machine.location = Some(location.clone());
    }
    if let Some(factory_id) = update.factory_id {
        machine.factory_id = Some(factory_id);
    }
    if let Some(error) = &update.error {
        machine.error = error.clone();
    }
    machine.last_update = Some(update.timestamp.unwrap_or(now));
}

/// First free `machine-<n>` key, counting from the roster length
///
/// Anonymous updates never match, so each one becomes a new entry.
fn fallback_key(machines: &[Machine]) -> String {
    let mut n = machines.len() + 1;
    loop {
        let candidate = format!("machine-{}", n);
        if machines.iter().all(|m| m.key != candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn new_machine(update: &StatusUpdate, machines: &[Machine], now: DateTime<Utc>) -> Machine {
    let key = update
        .machine_id
        .clone()
        .or_else(|| update.name.clone())
        .unwrap_or_else(|| fallback_key(machines));

    Machine {
        name: update.name.clone().unwrap_or_else(|| key.clone()),
        key,
        status: update.status.unwrap_or(MachineStatus::Offline),
        location: update.location.clone(),
        factory_id: update.factory_id,
        error: update.error.clone().flatten(),
        last_update: Some(update.timestamp.unwrap_or(now)),
    }
}
