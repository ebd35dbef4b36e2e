//! Derived status counts per factory and across the roster
//!
//! Everything here is a pure function of a roster snapshot and the factory
//! definitions.

pub mod publisher;
pub mod trend;

use serde::{Deserialize, Serialize};

use crate::roster::{Machine, RosterSnapshot};
use crate::status::MachineStatus;

/// A configured factory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryDefinition {
    pub id: u32,
    pub name: String,

    /// Other location spellings that belong to this factory
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Map position as `[latitude, longitude]`
    #[serde(default)]
    pub position: Option<[f64; 2]>,
}

impl FactoryDefinition {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            aliases: Vec::new(),
            position: None,
        }
    }

    /// Whether a machine belongs to this factory
    ///
    /// Locations compare case-insensitively against the name, the aliases and
    /// the id; a machine without a matching location may still match by
    /// factory id.
    pub fn contains(&self, machine: &Machine) -> bool {
        if machine.factory_id == Some(self.id) {
            return true;
        }
        let Some(location) = machine.location.as_deref() else {
            return false;
        };
        let location = location.trim();
        location.eq_ignore_ascii_case(self.name.trim())
            || location == self.id.to_string()
            || self
                .aliases
                .iter()
                .any(|alias| location.eq_ignore_ascii_case(alias.trim()))
    }
}

/// The factories shown by default
pub fn default_factories() -> Vec<FactoryDefinition> {
    vec![
        FactoryDefinition {
            id: 1,
            name: "Brazil".to_string(),
            aliases: vec!["Brasil".to_string()],
            position: Some([-13.920051047568641, -50.67785644713438]),
        },
        FactoryDefinition {
            id: 2,
            name: "Italy".to_string(),
            aliases: vec!["Italia".to_string()],
            position: Some([46.336829606339776, 13.138468541188923]),
        },
        FactoryDefinition {
            id: 3,
            name: "Vietnam".to_string(),
            aliases: Vec::new(),
            position: Some([17.41240398788743, 102.8124039972215]),
        },
    ]
}

/// Machine counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub operational: usize,
    pub maintenance: usize,
    pub alarm: usize,
    pub offline: usize,
    pub idle: usize,
}

impl StatusCounts {
    pub fn increment(&mut self, status: MachineStatus) {
        *self.slot(status) += 1;
    }

    pub fn get(&self, status: MachineStatus) -> usize {
        match status {
            MachineStatus::Operational => self.operational,
            MachineStatus::Maintenance => self.maintenance,
            MachineStatus::Alarm => self.alarm,
            MachineStatus::Offline => self.offline,
            MachineStatus::Idle => self.idle,
        }
    }

    pub fn total(&self) -> usize {
        MachineStatus::ALL.iter().map(|s| self.get(*s)).sum()
    }

    fn slot(&mut self, status: MachineStatus) -> &mut usize {
        match status {
            MachineStatus::Operational => &mut self.operational,
            MachineStatus::Maintenance => &mut self.maintenance,
            MachineStatus::Alarm => &mut self.alarm,
            MachineStatus::Offline => &mut self.offline,
            MachineStatus::Idle => &mut self.idle,
        }
    }
}

impl<'a> FromIterator<&'a Machine> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = &'a Machine>>(iter: I) -> Self {
        let mut counts = StatusCounts::default();
        for machine in iter {
            counts.increment(machine.status);
        }
        counts
    }
}

/// Counts for one factory
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryAggregate {
    pub factory: FactoryDefinition,
    pub counts: StatusCounts,
}

/// Counts per configured factory, in configuration order
pub fn aggregate_by_factory(
    roster: &RosterSnapshot,
    factories: &[FactoryDefinition],
) -> Vec<FactoryAggregate> {
    factories
        .iter()
        .map(|factory| FactoryAggregate {
            factory: factory.clone(),
            counts: roster
                .machines
                .iter()
                .filter(|m| factory.contains(m))
                .collect(),
        })
        .collect()
}

/// Counts across the whole roster
pub fn aggregate_global(roster: &RosterSnapshot) -> StatusCounts {
    roster.machines.iter().collect()
}

/// Machines of one factory, in roster order
pub fn machines_of<'a>(roster: &'a RosterSnapshot, factory: &FactoryDefinition) -> Vec<&'a Machine> {
    roster.machines.iter().filter(|m| factory.contains(m)).collect()
}

/// Everything the dashboard derives from one snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub version: u64,
    pub global: StatusCounts,
    pub factories: Vec<FactoryAggregate>,
}

impl DashboardView {
    pub fn build(roster: &RosterSnapshot, factories: &[FactoryDefinition]) -> Self {
        Self {
            version: roster.version,
            global: aggregate_global(roster),
            factories: aggregate_by_factory(roster, factories),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(key: &str, status: MachineStatus, location: Option<&str>) -> Machine {
        Machine {
            key: key.to_string(),
            name: key.to_string(),
            status,
            location: location.map(str::to_string),
            factory_id: None,
            error: None,
            last_update: None,
        }
    }

    #[test]
    fn test_location_matching() {
        let factory = default_factories().remove(0);
        assert!(factory.contains(&machine("a", MachineStatus::Idle, Some("brazil"))));
        assert!(factory.contains(&machine("b", MachineStatus::Idle, Some(" BRASIL "))));
        assert!(factory.contains(&machine("c", MachineStatus::Idle, Some("1"))));
        assert!(!factory.contains(&machine("d", MachineStatus::Idle, Some("italy"))));
        assert!(!factory.contains(&machine("e", MachineStatus::Idle, None)));

        let mut by_id = machine("f", MachineStatus::Idle, None);
        by_id.factory_id = Some(1);
        assert!(factory.contains(&by_id));
    }

    #[test]
    fn test_counts() {
        let roster = RosterSnapshot::new(vec![
            machine("a", MachineStatus::Operational, Some("Italy")),
            machine("b", MachineStatus::Alarm, Some("italy")),
            machine("c", MachineStatus::Alarm, None),
        ]);
        let global = aggregate_global(&roster);
        assert_eq!(global.alarm, 2);
        assert_eq!(global.operational, 1);
        assert_eq!(global.total(), 3);
    }

    #[test]
    fn test_view_build() {
        let roster = RosterSnapshot {
            version: 9,
            machines: vec![machine("a", MachineStatus::Idle, Some("Vietnam"))],
        };
        let view = DashboardView::build(&roster, &default_factories());
        assert_eq!(view.version, 9);
        assert_eq!(view.factories.len(), 3);
        assert_eq!(view.factories[2].counts.idle, 1);
        assert_eq!(view.factories[0].counts, StatusCounts::default());
    }
}
