//! Machine status enumeration and its mapping tables
//!
//! Every conversion between wire codes, free-form strings, display labels
//! and display colors goes through [`STATUS_TABLE`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical machine status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MachineStatus {
    Operational,
    Maintenance,
    Alarm,
    Offline,
    Idle,
}

/// Display color of a status tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Green,
    Yellow,
    Red,
    Gray,
    Blue,
}

impl StatusColor {
    pub fn name(&self) -> &'static str {
        match self {
            StatusColor::Green => "green",
            StatusColor::Yellow => "yellow",
            StatusColor::Red => "red",
            StatusColor::Gray => "gray",
            StatusColor::Blue => "blue",
        }
    }

    /// Terminal color for CLI rendering
    pub fn to_terminal(&self) -> colored::Color {
        match self {
            StatusColor::Green => colored::Color::Green,
            StatusColor::Yellow => colored::Color::Yellow,
            StatusColor::Red => colored::Color::Red,
            StatusColor::Gray => colored::Color::BrightBlack,
            StatusColor::Blue => colored::Color::Blue,
        }
    }
}

/// One row of the status table
#[derive(Debug)]
pub struct StatusEntry {
    pub status: MachineStatus,
    pub code: u8,
    pub label: &'static str,
    /// Lowercase strings accepted at ingestion
    pub aliases: &'static [&'static str],
    pub color: StatusColor,
}

pub const STATUS_TABLE: [StatusEntry; 5] = [
    StatusEntry {
        status: MachineStatus::Operational,
        code: 1,
        label: "Operational",
        aliases: &["operational", "running"],
        color: StatusColor::Green,
    },
    StatusEntry {
        status: MachineStatus::Maintenance,
        code: 2,
        label: "Maintenance",
        aliases: &["maintenance"],
        color: StatusColor::Yellow,
    },
    StatusEntry {
        status: MachineStatus::Alarm,
        code: 3,
        label: "Alarm",
        aliases: &["alarm", "error"],
        color: StatusColor::Red,
    },
    StatusEntry {
        status: MachineStatus::Offline,
        code: 4,
        label: "Offline",
        aliases: &["offline", "pending"],
        color: StatusColor::Gray,
    },
    StatusEntry {
        status: MachineStatus::Idle,
        code: 5,
        label: "Idle",
        aliases: &["idle"],
        color: StatusColor::Blue,
    },
];

impl MachineStatus {
    /// All statuses in table order
    pub const ALL: [MachineStatus; 5] = [
        MachineStatus::Operational,
        MachineStatus::Maintenance,
        MachineStatus::Alarm,
        MachineStatus::Offline,
        MachineStatus::Idle,
    ];

    fn entry(&self) -> &'static StatusEntry {
        // Table order matches declaration order
        &STATUS_TABLE[*self as usize]
    }

    pub fn code(&self) -> u8 {
        self.entry().code
    }

    pub fn label(&self) -> &'static str {
        self.entry().label
    }

    pub fn color(&self) -> StatusColor {
        self.entry().color
    }

    /// Look up a wire code
    pub fn from_code(code: i64) -> Option<Self> {
        STATUS_TABLE
            .iter()
            .find(|e| i64::from(e.code) == code)
            .map(|e| e.status)
    }

    /// Look up a free-form string (case-insensitive), digit strings go through the code table
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase();
        if let Ok(code) = normalized.parse::<i64>() {
            return Self::from_code(code);
        }
        STATUS_TABLE
            .iter()
            .find(|e| e.aliases.contains(&normalized.as_str()))
            .map(|e| e.status)
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolve a raw status value, defaulting to `Offline`
pub fn resolve_status(value: Option<&Value>) -> MachineStatus {
    let resolved = match value {
        Some(Value::Number(n)) => n.as_i64().and_then(MachineStatus::from_code),
        Some(Value::String(s)) => MachineStatus::from_name(s),
        _ => None,
    };
    resolved.unwrap_or(MachineStatus::Offline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_order_matches_enum() {
        for (index, status) in MachineStatus::ALL.iter().enumerate() {
            assert_eq!(STATUS_TABLE[index].status, *status);
        }
    }

    #[test]
    fn test_codes_round_trip() {
        for status in MachineStatus::ALL {
            assert_eq!(MachineStatus::from_code(status.code().into()), Some(status));
        }
        assert_eq!(MachineStatus::Alarm.code(), 3);
        assert_eq!(MachineStatus::Idle.code(), 5);
    }

    #[test]
    fn test_resolve_strings() {
        assert_eq!(resolve_status(Some(&json!("running"))), MachineStatus::Operational);
        assert_eq!(resolve_status(Some(&json!("RUNNING"))), MachineStatus::Operational);
        assert_eq!(resolve_status(Some(&json!("error"))), MachineStatus::Alarm);
        assert_eq!(resolve_status(Some(&json!("pending"))), MachineStatus::Offline);
        assert_eq!(resolve_status(Some(&json!("Maintenance"))), MachineStatus::Maintenance);
        assert_eq!(resolve_status(Some(&json!(" idle "))), MachineStatus::Idle);
        assert_eq!(resolve_status(Some(&json!("3"))), MachineStatus::Alarm);
    }

    #[test]
    fn test_resolve_unknown_defaults_to_offline() {
        assert_eq!(resolve_status(Some(&json!(99))), MachineStatus::Offline);
        assert_eq!(resolve_status(Some(&json!(0))), MachineStatus::Offline);
        assert_eq!(resolve_status(Some(&json!(-1))), MachineStatus::Offline);
        assert_eq!(resolve_status(Some(&json!(2.5))), MachineStatus::Offline);
        assert_eq!(resolve_status(Some(&json!("exploded"))), MachineStatus::Offline);
        assert_eq!(resolve_status(Some(&json!(""))), MachineStatus::Offline);
        assert_eq!(resolve_status(Some(&json!(true))), MachineStatus::Offline);
        assert_eq!(resolve_status(Some(&json!({"code": 1}))), MachineStatus::Offline);
        assert_eq!(resolve_status(Some(&Value::Null)), MachineStatus::Offline);
        assert_eq!(resolve_status(None), MachineStatus::Offline);
    }

    #[test]
    fn test_colors() {
        assert_eq!(MachineStatus::Operational.color(), StatusColor::Green);
        assert_eq!(MachineStatus::Alarm.color().name(), "red");
        assert_eq!(MachineStatus::Offline.color().to_terminal(), colored::Color::BrightBlack);
    }
}
