//! Server state

use std::sync::Arc;

use crate::aggregate::publisher::DashboardPublisher;
use crate::http::client::HttpClient;
use crate::hub::connection::ConnectionTracker;
use crate::notifications::NotificationFeed;
use crate::roster::store::RosterStore;

/// Server state shared across handlers
pub struct ServerState {
    pub roster: Arc<RosterStore>,
    pub connection: Arc<ConnectionTracker>,
    pub dashboard: Arc<DashboardPublisher>,
    pub notifications: Arc<NotificationFeed>,
    pub http_client: Arc<HttpClient>,
}

impl ServerState {
    pub fn new(
        roster: Arc<RosterStore>,
        connection: Arc<ConnectionTracker>,
        dashboard: Arc<DashboardPublisher>,
        notifications: Arc<NotificationFeed>,
        http_client: Arc<HttpClient>,
    ) -> Self {
        Self {
            roster,
            connection,
            dashboard,
            notifications,
            http_client,
        }
    }
}
