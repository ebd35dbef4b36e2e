//! Dashboard API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub connection: String,
}

/// Version response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// One state change of the hub connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: String,
    pub to: String,
    pub at: DateTime<Utc>,
}

/// Hub connection response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub state: String,
    pub endpoint: String,
    pub reconnects: u32,
    pub history: Vec<TransitionRecord>,
}

/// Machine entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineEntry {
    pub key: String,
    pub name: String,
    pub status: String,
    pub status_code: u8,
    pub color: String,
    pub location: Option<String>,
    pub factory_id: Option<u32>,
    pub error: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

/// Roster response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterResponse {
    pub version: u64,
    pub total: usize,
    pub machines: Vec<MachineEntry>,
}

/// Status counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCountsEntry {
    pub operational: usize,
    pub idle: usize,
    pub alarm: usize,
    pub maintenance: usize,
    pub offline: usize,
    pub total: usize,
}

/// Factory aggregate entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryEntry {
    pub id: u32,
    pub name: String,
    pub position: Option<[f64; 2]>,
    pub counts: StatusCountsEntry,
}

/// Aggregates response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatesResponse {
    pub version: u64,
    pub global: StatusCountsEntry,
    pub factories: Vec<FactoryEntry>,
}

/// Factory detail response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryDetailResponse {
    pub factory: FactoryEntry,
    pub machines: Vec<MachineEntry>,
}

/// Trend point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPointEntry {
    pub at: DateTime<Utc>,
    pub operational: Vec<FactoryOperational>,
}

/// Operational machines of one factory at a trend point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryOperational {
    pub factory: String,
    pub operational: usize,
}

/// Trend response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendResponse {
    pub points: Vec<TrendPointEntry>,
}

/// Notification entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub kind: String,
    pub received_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// Notifications response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<NotificationEntry>,
    pub total: usize,
}

/// Event log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub severity: String,
    pub time: Option<DateTime<Utc>>,
    pub source: String,
    pub message: String,
}

/// Event log response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<EventEntry>,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
