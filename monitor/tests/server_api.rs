mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use dashboard_models::{
    AggregatesResponse, ConnectionResponse, ErrorResponse, FactoryDetailResponse, HealthResponse,
    NotificationsResponse, RosterResponse, StatusCountsEntry, TrendResponse,
};
use mokamon::app::options::AppOptions;
use mokamon::app::state::AppState;
use mokamon::hub::connection::ConnectionEvent;
use mokamon::server::serve::router;
use serde::de::DeserializeOwned;
use serde_json::json;
use tower::ServiceExt;
use url::Url;

use common::ScriptedConnector;

fn app_state() -> Arc<AppState> {
    let mut options = AppOptions::for_endpoint(Url::parse("http://localhost:1/productionHub").unwrap());
    options.backend_base_url = "http://127.0.0.1:9".to_string();
    Arc::new(AppState::init(&options, ScriptedConnector::new(Vec::new())).unwrap())
}

async fn get<T: DeserializeOwned>(state: &AppState, uri: &str) -> (StatusCode, T) {
    let response = router(Arc::new(state.server_state()))
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_reports_connection_state() {
    let state = app_state();
    state.connection.record(ConnectionEvent::Start);
    state.connection.record(ConnectionEvent::Established);

    let (status, body): (_, HealthResponse) = get(&state, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.status, "healthy");
    assert_eq!(body.connection, "connected");

    let (_, body): (_, ConnectionResponse) = get(&state, "/connection").await;
    assert_eq!(body.state, "connected");
    assert_eq!(body.endpoint, "scripted://hub");
    assert_eq!(body.history.len(), 2);
}

#[tokio::test]
async fn test_roster_and_aggregates() {
    let state = app_state();
    state
        .roster
        .apply_payload(&json!({ "Machine": "cnc_italy", "Status": 1, "ErrorMessage": null }))
        .unwrap();
    state
        .roster
        .apply_payload(&json!({ "Machine": "press_9", "Location": "Italia", "Status": "alarm", "ErrorMessage": "hydraulics" }))
        .unwrap();
    state.dashboard.refresh(&state.roster.snapshot(), Utc::now());

    let (status, roster): (_, RosterResponse) = get(&state, "/roster").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster.version, 2);
    assert_eq!(roster.total, 13);
    let press = roster.machines.iter().find(|m| m.key == "press_9").unwrap();
    assert_eq!(press.status, "Alarm");
    assert_eq!(press.status_code, 3);
    assert_eq!(press.color, "red");
    assert_eq!(press.error.as_deref(), Some("hydraulics"));

    let (_, aggregates): (_, AggregatesResponse) = get(&state, "/aggregates").await;
    assert_eq!(aggregates.version, 2);
    assert_eq!(aggregates.global.total, 13);
    let italy = aggregates.factories.iter().find(|f| f.name == "Italy").unwrap();
    assert_eq!(italy.counts.operational, 1);
    assert_eq!(italy.counts.alarm, 1);
    assert_eq!(italy.counts.total, 5);

    let (_, global): (_, StatusCountsEntry) = get(&state, "/aggregates/global").await;
    assert_eq!(global.operational, 1);
    assert_eq!(global.offline, 11);

    let (_, trend): (_, TrendResponse) = get(&state, "/trend").await;
    assert_eq!(trend.points.len(), 1);
}

#[tokio::test]
async fn test_factory_detail_and_not_found() {
    let state = app_state();

    let (status, detail): (_, FactoryDetailResponse) = get(&state, "/factories/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail.factory.name, "Vietnam");
    assert_eq!(detail.machines.len(), 4);
    assert_eq!(detail.factory.counts.offline, 4);

    let (status, error): (_, ErrorResponse) = get(&state, "/factories/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error.error.contains("42"));
}

#[tokio::test]
async fn test_notifications_feed() {
    let state = app_state();
    state
        .notifications
        .push_payload("orderFulfilled", &json!({ "orderId": 5 }), Utc::now())
        .unwrap();

    let (_, body): (_, NotificationsResponse) = get(&state, "/notifications").await;
    assert_eq!(body.total, 1);
    assert_eq!(body.notifications[0].kind, "orderFulfilled");
    assert_eq!(body.notifications[0].payload["orderId"], 5);
}

#[tokio::test]
async fn test_events_report_unreachable_backend() {
    let state = app_state();
    let (status, body): (_, ErrorResponse) = get(&state, "/events").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!body.error.is_empty());
}
