//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{http::Method, routing::get, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::MonitorError;
use crate::server::handlers::{
    aggregates_handler, connection_handler, events_handler, factory_handler, global_handler,
    health_handler, notifications_handler, roster_handler, trend_handler, version_handler,
};
use crate::server::state::ServerState;

/// Routes of the local JSON API
pub fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Hub connection
        .route("/connection", get(connection_handler))
        // Roster and derived views
        .route("/roster", get(roster_handler))
        .route("/aggregates", get(aggregates_handler))
        .route("/aggregates/global", get(global_handler))
        .route("/factories/{id}", get(factory_handler))
        .route("/trend", get(trend_handler))
        // Activity
        .route("/notifications", get(notifications_handler))
        .route("/events", get(events_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), MonitorError>>, MonitorError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| MonitorError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| MonitorError::ServerError(e.to_string()))
    });

    Ok(handle)
}
