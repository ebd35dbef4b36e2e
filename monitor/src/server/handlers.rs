//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use dashboard_models::{
    AggregatesResponse, ConnectionResponse, ErrorResponse, EventEntry, EventsResponse,
    FactoryDetailResponse, FactoryEntry, FactoryOperational, HealthResponse, MachineEntry,
    NotificationEntry, NotificationsResponse, RosterResponse, StatusCountsEntry,
    TransitionRecord, TrendPointEntry, TrendResponse, VersionResponse,
};
use tracing::error;

use crate::aggregate::{machines_of, FactoryAggregate, StatusCounts};
use crate::notifications::orders::order_events;
use crate::roster::Machine;
use crate::server::state::ServerState;
use crate::utils::version_info;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "mokamon".to_string(),
        version: version.version,
        connection: state.connection.state().as_str().to_string(),
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Hub connection state and transition history
pub async fn connection_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let tracker = &state.connection;
    Json(ConnectionResponse {
        state: tracker.state().as_str().to_string(),
        endpoint: tracker.endpoint().to_string(),
        reconnects: tracker.reconnects(),
        history: tracker
            .history()
            .into_iter()
            .map(|t| TransitionRecord {
                from: t.from.as_str().to_string(),
                to: t.to.as_str().to_string(),
                at: t.at,
            })
            .collect(),
    })
}

/// Current roster snapshot
pub async fn roster_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let snapshot = state.roster.snapshot();
    Json(RosterResponse {
        version: snapshot.version,
        total: snapshot.len(),
        machines: snapshot.machines.iter().map(machine_entry).collect(),
    })
}

/// Global and per-factory counts
pub async fn aggregates_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let view = state.dashboard.view();
    Json(AggregatesResponse {
        version: view.version,
        global: counts_entry(&view.global),
        factories: view.factories.iter().map(factory_entry).collect(),
    })
}

pub async fn global_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(counts_entry(&state.dashboard.view().global))
}

/// One factory with its machines
pub async fn factory_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u32>,
) -> Result<impl IntoResponse, ApiError> {
    let factory = state
        .dashboard
        .factory(id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("factory {} not found", id)))?;

    let snapshot = state.roster.snapshot();
    let machines = machines_of(&snapshot, factory);
    let aggregate = FactoryAggregate {
        factory: factory.clone(),
        counts: machines.iter().copied().collect(),
    };

    Ok(Json(FactoryDetailResponse {
        factory: factory_entry(&aggregate),
        machines: machines.into_iter().map(machine_entry).collect(),
    }))
}

/// Operational trend, oldest first
pub async fn trend_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(TrendResponse {
        points: state
            .dashboard
            .trend()
            .into_iter()
            .map(|point| TrendPointEntry {
                at: point.at,
                operational: point
                    .operational
                    .into_iter()
                    .map(|(factory, operational)| FactoryOperational {
                        factory,
                        operational,
                    })
                    .collect(),
            })
            .collect(),
    })
}

/// Notification feed, newest first
pub async fn notifications_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(NotificationsResponse {
        notifications: state
            .notifications
            .list()
            .into_iter()
            .map(|n| NotificationEntry {
                kind: n.kind,
                received_at: n.received_at,
                payload: n.payload,
            })
            .collect(),
        total: state.notifications.received(),
    })
}

/// Recent orders as event log rows
pub async fn events_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, ApiError> {
    let client = &state.http_client;
    let (orders, customers) = tokio::join!(client.get_orders(), client.get_customers());

    let orders = orders.map_err(|e| {
        error!("Failed to fetch orders: {}", e);
        api_error(StatusCode::BAD_GATEWAY, e.to_string())
    })?;
    // names are optional, fall back to customer ids
    let customers = customers.unwrap_or_else(|e| {
        error!("Failed to fetch customers: {}", e);
        Vec::new()
    });

    Ok(Json(EventsResponse {
        events: order_events(&orders, &customers)
            .into_iter()
            .map(|e| EventEntry {
                severity: e.severity.to_string(),
                time: e.time,
                source: e.source,
                message: e.message,
            })
            .collect(),
    }))
}

pub fn machine_entry(machine: &Machine) -> MachineEntry {
    MachineEntry {
        key: machine.key.clone(),
        name: machine.name.clone(),
        status: machine.status.label().to_string(),
        status_code: machine.status.code(),
        color: machine.status.color().name().to_string(),
        location: machine.location.clone(),
        factory_id: machine.factory_id,
        error: machine.error.clone(),
        last_update: machine.last_update,
    }
}

pub fn counts_entry(counts: &StatusCounts) -> StatusCountsEntry {
    StatusCountsEntry {
        operational: counts.operational,
        idle: counts.idle,
        alarm: counts.alarm,
        maintenance: counts.maintenance,
        offline: counts.offline,
        total: counts.total(),
    }
}

fn factory_entry(aggregate: &FactoryAggregate) -> FactoryEntry {
    FactoryEntry {
        id: aggregate.factory.id,
        name: aggregate.factory.name.clone(),
        position: aggregate.factory.position,
        counts: counts_entry(&aggregate.counts),
    }
}
