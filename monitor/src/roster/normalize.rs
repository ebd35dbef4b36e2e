//! Normalization of raw status payloads
//!
//! Upstream producers disagree on field names and casing. Each logical field
//! is resolved through [`ALIAS_TABLE`], trying aliases in order.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::MonitorError;
use crate::status::{resolve_status, MachineStatus};

/// Logical fields of a status event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalField {
    Id,
    Name,
    Location,
    Status,
    Error,
    FactoryId,
    Timestamp,
}

/// Ordered aliases of one logical field
#[derive(Debug)]
pub struct FieldAliases {
    pub field: LogicalField,
    pub aliases: &'static [&'static str],
}

pub const ALIAS_TABLE: [FieldAliases; 7] = [
    FieldAliases {
        field: LogicalField::Id,
        aliases: &["machineId", "MachineId", "machine_id", "Machine", "machine", "id", "Id"],
    },
    FieldAliases {
        field: LogicalField::Name,
        aliases: &["name", "Name", "machineName", "MachineName"],
    },
    FieldAliases {
        field: LogicalField::Location,
        aliases: &["Location", "location", "plant", "Plant"],
    },
    FieldAliases {
        field: LogicalField::Status,
        aliases: &["Status", "status", "state", "State"],
    },
    FieldAliases {
        field: LogicalField::Error,
        aliases: &["ErrorMessage", "errorMessage", "errormessage", "error", "Error"],
    },
    FieldAliases {
        field: LogicalField::FactoryId,
        aliases: &["factoryId", "FactoryId", "factory_id"],
    },
    FieldAliases {
        field: LogicalField::Timestamp,
        aliases: &["timestamp", "Timestamp", "lastUpdate", "LastUpdate"],
    },
];

/// Aliases of a logical field
pub fn aliases_of(field: LogicalField) -> &'static [&'static str] {
    ALIAS_TABLE
        .iter()
        .find(|entry| entry.field == field)
        .map(|entry| entry.aliases)
        .unwrap_or(&[])
}

/// First non-null value among the field's aliases
pub fn resolve_field(payload: &Map<String, Value>, field: LogicalField) -> Option<&Value> {
    aliases_of(field)
        .iter()
        .filter_map(|alias| payload.get(*alias))
        .find(|value| !value.is_null())
}

fn has_explicit_null(payload: &Map<String, Value>, field: LogicalField) -> bool {
    aliases_of(field)
        .iter()
        .any(|alias| matches!(payload.get(*alias), Some(Value::Null)))
}

/// Partial machine record extracted from one status event
///
/// `None` means the event did not carry the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusUpdate {
    pub machine_id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub factory_id: Option<u32>,
    pub status: Option<MachineStatus>,
    /// `Some(None)` clears the stored error
    pub error: Option<Option<String>>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    /// Identity candidates in priority order
    pub fn identity_aliases(&self) -> Vec<&str> {
        self.machine_id
            .iter()
            .chain(self.name.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Turn a hub argument into a JSON object
///
/// Producers send either an object or a JSON-encoded string of one.
pub fn parse_payload(raw: &Value) -> Result<Map<String, Value>, MonitorError> {
    match raw {
        Value::Object(map) => Ok(map.clone()),
        Value::String(text) => match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(map),
            other => Err(MonitorError::PayloadError(format!(
                "expected an object, got {}",
                json_kind(&other)
            ))),
        },
        other => Err(MonitorError::PayloadError(format!(
            "expected an object or string, got {}",
            json_kind(other)
        ))),
    }
}

/// Normalize a status payload into a [`StatusUpdate`]
pub fn normalize(raw: &Value) -> Result<StatusUpdate, MonitorError> {
    let payload = parse_payload(raw)?;

    let error = match resolve_field(&payload, LogicalField::Error) {
        Some(Value::String(s)) if s.trim().is_empty() => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(other) => Some(Some(other.to_string())),
        None if has_explicit_null(&payload, LogicalField::Error) => Some(None),
        None => None,
    };

    let update = StatusUpdate {
        machine_id: resolve_field(&payload, LogicalField::Id).and_then(identity_string),
        name: resolve_field(&payload, LogicalField::Name).and_then(identity_string),
        location: resolve_field(&payload, LogicalField::Location).and_then(text_value),
        factory_id: resolve_field(&payload, LogicalField::FactoryId).and_then(factory_id_value),
        status: resolve_field(&payload, LogicalField::Status).map(|v| resolve_status(Some(v))),
        error,
        timestamp: resolve_field(&payload, LogicalField::Timestamp).and_then(timestamp_value),
    };

    Ok(update)
}

fn identity_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        other => text_value(other),
    }
}

fn text_value(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn factory_id_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|id| u32::try_from(id).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    match DateTime::parse_from_rfc3339(text) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            debug!("Ignoring unparsable timestamp {:?}: {}", text, e);
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_aliases_first_match_wins() {
        let update = normalize(&json!({
            "machineId": "M-1",
            "Machine": "M-2",
            "location": "italy",
            "Location": "Vietnam"
        }))
        .unwrap();
        assert_eq!(update.machine_id.as_deref(), Some("M-1"));
        assert_eq!(update.location.as_deref(), Some("Vietnam"));
    }

    #[test]
    fn test_null_alias_falls_through() {
        let update = normalize(&json!({"Machine": null, "machine": "CNC-01"})).unwrap();
        assert_eq!(update.machine_id.as_deref(), Some("CNC-01"));
    }

    #[test]
    fn test_pascal_case_payload() {
        let update = normalize(&json!({
            "Machine": "CNC-01",
            "Location": "Italy",
            "Status": 3,
            "ErrorMessage": "Spindle overheating"
        }))
        .unwrap();
        assert_eq!(update.machine_id.as_deref(), Some("CNC-01"));
        assert_eq!(update.status, Some(MachineStatus::Alarm));
        assert_eq!(update.error, Some(Some("Spindle overheating".to_string())));
        assert_eq!(update.name, None);
    }

    #[test]
    fn test_json_string_payload() {
        let raw = json!(r#"{"machine":"CNC-01","status":"running","location":"italy"}"#);
        let update = normalize(&raw).unwrap();
        assert_eq!(update.machine_id.as_deref(), Some("CNC-01"));
        assert_eq!(update.status, Some(MachineStatus::Operational));
        assert_eq!(update.location.as_deref(), Some("italy"));
    }

    #[test]
    fn test_error_field_states() {
        assert_eq!(normalize(&json!({"machine": "A"})).unwrap().error, None);
        assert_eq!(normalize(&json!({"machine": "A", "error": null})).unwrap().error, Some(None));
        assert_eq!(normalize(&json!({"machine": "A", "errormessage": ""})).unwrap().error, Some(None));
    }

    #[test]
    fn test_numeric_identity_and_factory() {
        let update = normalize(&json!({"id": 42, "factoryId": "2"})).unwrap();
        assert_eq!(update.machine_id.as_deref(), Some("42"));
        assert_eq!(update.factory_id, Some(2));
    }

    #[test]
    fn test_timestamp() {
        let update = normalize(&json!({"machine": "A", "timestamp": "2025-06-01T10:00:00Z"})).unwrap();
        assert_eq!(update.timestamp.unwrap().to_rfc3339(), "2025-06-01T10:00:00+00:00");
        let update = normalize(&json!({"machine": "A", "timestamp": "yesterday"})).unwrap();
        assert!(update.timestamp.is_none());
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(normalize(&json!("{not json")), Err(MonitorError::JsonError(_))));
        assert!(matches!(normalize(&json!("[1,2]")), Err(MonitorError::PayloadError(_))));
        assert!(matches!(normalize(&json!(12)), Err(MonitorError::PayloadError(_))));
        assert!(matches!(normalize(&Value::Null), Err(MonitorError::PayloadError(_))));
    }

    #[test]
    fn test_every_field_has_aliases() {
        for field in [
            LogicalField::Id,
            LogicalField::Name,
            LogicalField::Location,
            LogicalField::Status,
            LogicalField::Error,
            LogicalField::FactoryId,
            LogicalField::Timestamp,
        ] {
            assert!(!aliases_of(field).is_empty());
        }
    }
}
