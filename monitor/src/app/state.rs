//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::aggregate::publisher::DashboardPublisher;
use crate::app::options::AppOptions;
use crate::errors::MonitorError;
use crate::handlers::{NotificationHandler, StatusHandler};
use crate::http::client::HttpClient;
use crate::hub::connection::ConnectionTracker;
use crate::hub::dispatch::Dispatcher;
use crate::hub::events::HubEvents;
use crate::hub::transport::HubConnector;
use crate::notifications::NotificationFeed;
use crate::roster::seed::default_seed;
use crate::roster::store::RosterStore;
use crate::server::state::ServerState;

/// Main application state
pub struct AppState {
    /// Machine roster
    pub roster: Arc<RosterStore>,

    /// Hub connection state
    pub connection: Arc<ConnectionTracker>,

    /// Derived views
    pub dashboard: Arc<DashboardPublisher>,

    /// Production notifications
    pub notifications: Arc<NotificationFeed>,

    /// Routes hub events to the handlers above
    pub dispatcher: Arc<Dispatcher>,

    /// Opens hub sessions
    pub connector: Arc<dyn HubConnector>,

    /// HTTP client for backend communication
    pub http_client: Arc<HttpClient>,
}

impl AppState {
    /// Initialize application state
    pub fn init(
        options: &AppOptions,
        connector: Arc<dyn HubConnector>,
    ) -> Result<Self, MonitorError> {
        info!("Initializing application state...");

        let seed = if options.roster.seed {
            default_seed()
        } else {
            Vec::new()
        };
        let roster = Arc::new(RosterStore::new(seed.clone(), options.roster.reconcile));

        let connection = Arc::new(ConnectionTracker::new(connector.endpoint()));
        let dashboard = Arc::new(DashboardPublisher::new(
            options.factories.clone(),
            options.trend_capacity,
        ));
        let notifications = Arc::new(NotificationFeed::new(options.notification_capacity));

        let status_handler = Arc::new(StatusHandler::new(
            roster.clone(),
            options.roster.on_reconnect,
            seed,
        ));
        let dispatcher = Dispatcher::new()
            .on(HubEvents::STATUS, status_handler.clone())
            .on(
                HubEvents::LOT_COMPLETED,
                Arc::new(NotificationHandler::new(
                    HubEvents::LOT_COMPLETED,
                    notifications.clone(),
                )),
            )
            .on(
                HubEvents::ORDER_FULFILLED,
                Arc::new(NotificationHandler::new(
                    HubEvents::ORDER_FULFILLED,
                    notifications.clone(),
                )),
            )
            .observe(status_handler);

        let http_client = Arc::new(HttpClient::new(&options.backend_base_url)?);

        Ok(Self {
            roster,
            connection,
            dashboard,
            notifications,
            dispatcher: Arc::new(dispatcher),
            connector,
            http_client,
        })
    }

    /// State handed to the HTTP server
    pub fn server_state(&self) -> ServerState {
        ServerState::new(
            self.roster.clone(),
            self.connection.clone(),
            self.dashboard.clone(),
            self.notifications.clone(),
            self.http_client.clone(),
        )
    }
}
