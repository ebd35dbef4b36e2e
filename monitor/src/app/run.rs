//! Main application run loop

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::errors::MonitorError;
use crate::hub::connection::ConnectionState;
use crate::hub::transport::HubConnector;
use crate::hub::websocket::WsConnector;
use crate::server::serve::serve;
use crate::workers::{aggregator, hub};

/// Run the monitor against the configured hub
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), MonitorError> {
    let connector = Arc::new(WsConnector::new(options.hub.clone())?);
    run_with_connector(options, connector, shutdown_signal).await
}

/// Run the monitor with a given hub connector
pub async fn run_with_connector(
    options: AppOptions,
    connector: Arc<dyn HubConnector>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), MonitorError> {
    info!("Initializing factory monitor...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, connector, &shutdown_tx, &mut shutdown_manager).await {
        error!("Failed to start monitor: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

/// Result of [`observe_once`]
pub struct Observation {
    pub state: Arc<AppState>,

    /// Connection state right before the worker was stopped
    pub connection: ConnectionState,
}

/// Connect, collect events for a while, then return what was observed
pub async fn observe_once(
    options: &AppOptions,
    connector: Arc<dyn HubConnector>,
    duration: Duration,
) -> Result<Observation, MonitorError> {
    let app_state = Arc::new(AppState::init(options, connector)?);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = spawn_hub_worker(options.hub_worker.clone(), app_state.clone(), shutdown_rx);

    tokio::time::sleep(duration).await;
    let connection = app_state.connection.state();
    let _ = shutdown_tx.send(());
    handle
        .await
        .map_err(|e| MonitorError::ShutdownError(e.to_string()))?;

    Ok(Observation {
        state: app_state,
        connection,
    })
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    connector: Arc<dyn HubConnector>,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<AppState>, MonitorError> {
    let app_state = Arc::new(AppState::init(options, connector)?);

    init_aggregator_worker(app_state.clone(), shutdown_manager, shutdown_tx.subscribe())?;

    init_hub_worker(
        options.hub_worker.clone(),
        app_state.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    if options.enable_server {
        init_server(options, app_state.clone(), shutdown_manager, shutdown_tx.subscribe())
            .await?;
    }

    Ok(app_state)
}

/// Spawn the hub worker
pub fn spawn_hub_worker(
    options: hub::Options,
    app_state: Arc<AppState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        hub::run(
            &options,
            app_state.connector.as_ref(),
            app_state.dispatcher.as_ref(),
            app_state.connection.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    })
}

fn init_hub_worker(
    options: hub::Options,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), MonitorError> {
    info!("Initializing hub worker...");
    let handle = spawn_hub_worker(options, app_state, shutdown_rx);
    shutdown_manager.with_hub_worker_handle(handle)
}

fn init_aggregator_worker(
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), MonitorError> {
    info!("Initializing aggregator worker...");

    let roster_rx = app_state.roster.subscribe();
    let handle = tokio::spawn(async move {
        aggregator::run(
            app_state.dashboard.as_ref(),
            roster_rx,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_aggregator_worker_handle(handle)
}

async fn init_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), MonitorError> {
    info!("Initializing local HTTP server...");

    let server_handle = serve(&options.server, Arc::new(app_state.server_state()), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    hub_worker_handle: Option<JoinHandle<()>>,
    aggregator_worker_handle: Option<JoinHandle<()>>,
    server_handle: Option<JoinHandle<Result<(), MonitorError>>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            hub_worker_handle: None,
            aggregator_worker_handle: None,
            server_handle: None,
        }
    }

    fn with_hub_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), MonitorError> {
        if self.hub_worker_handle.is_some() {
            return Err(MonitorError::ShutdownError("hub_handle already set".to_string()));
        }
        self.hub_worker_handle = Some(handle);
        Ok(())
    }

    fn with_aggregator_worker_handle(
        &mut self,
        handle: JoinHandle<()>,
    ) -> Result<(), MonitorError> {
        if self.aggregator_worker_handle.is_some() {
            return Err(MonitorError::ShutdownError(
                "aggregator_handle already set".to_string(),
            ));
        }
        self.aggregator_worker_handle = Some(handle);
        Ok(())
    }

    fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), MonitorError>>,
    ) -> Result<(), MonitorError> {
        if self.server_handle.is_some() {
            return Err(MonitorError::ShutdownError("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), MonitorError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), MonitorError> {
        info!("Shutting down factory monitor...");

        // hub first so the session is released before readers go away
        if let Some(handle) = self.hub_worker_handle.take() {
            handle.await.map_err(|e| MonitorError::ShutdownError(e.to_string()))?;
        }

        if let Some(handle) = self.aggregator_worker_handle.take() {
            handle.await.map_err(|e| MonitorError::ShutdownError(e.to_string()))?;
        }

        if let Some(handle) = self.server_handle.take() {
            handle.await.map_err(|e| MonitorError::ShutdownError(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
