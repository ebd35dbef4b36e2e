//! Application configuration options

use std::time::Duration;

use url::Url;

use crate::aggregate::trend::DEFAULT_TREND_CAPACITY;
use crate::aggregate::{default_factories, FactoryDefinition};
use crate::errors::MonitorError;
use crate::hub::websocket::WsOptions;
use crate::notifications::DEFAULT_NOTIFICATION_CAPACITY;
use crate::roster::reconcile::ReconcileOptions;
use crate::roster::ReconnectPolicy;
use crate::storage::settings::Settings;
use crate::utils::CooldownOptions;
use crate::workers::hub;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Hub transport options
    pub hub: WsOptions,

    /// Hub worker options
    pub hub_worker: hub::Options,

    /// Backend API base URL
    pub backend_base_url: String,

    /// Enable local HTTP server
    pub enable_server: bool,

    /// Server configuration
    pub server: ServerOptions,

    /// Roster configuration
    pub roster: RosterOptions,

    /// Factories in display order
    pub factories: Vec<FactoryDefinition>,

    pub trend_capacity: usize,
    pub notification_capacity: usize,
}

impl AppOptions {
    /// Convert settings into runtime options
    pub fn from_settings(settings: &Settings) -> Result<Self, MonitorError> {
        let endpoint = Url::parse(&settings.hub.url).map_err(|e| {
            MonitorError::ConfigError(format!("invalid hub url {}: {}", settings.hub.url, e))
        })?;

        let hub = WsOptions {
            skip_negotiation: settings.hub.skip_negotiation,
            keep_alive_interval: Duration::from_secs(settings.hub.keep_alive_secs.max(1)),
            server_timeout: Duration::from_secs(settings.hub.server_timeout_secs.max(1)),
            ..WsOptions::new(endpoint)
        };

        let hub_worker = hub::Options {
            reconnect_delays: settings
                .hub
                .reconnect_delays_secs
                .iter()
                .map(|secs| Duration::from_secs(*secs))
                .collect(),
            retry_cooldown: CooldownOptions::new(
                Duration::from_secs(settings.hub.retry_base_delay_secs),
                Duration::from_secs(settings.hub.retry_max_delay_secs),
            ),
        };

        Ok(Self {
            lifecycle: LifecycleOptions::default(),
            hub,
            hub_worker,
            backend_base_url: settings.backend.base_url.clone(),
            enable_server: settings.server.enabled,
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            roster: RosterOptions {
                seed: settings.roster.seed,
                on_reconnect: settings.roster.on_reconnect,
                reconcile: ReconcileOptions {
                    strict_identity: settings.roster.strict_identity,
                },
            },
            factories: settings.factories.clone(),
            trend_capacity: settings.trend_capacity,
            notification_capacity: settings.notification_capacity,
        })
    }

    /// Options for a hub endpoint with everything else at its default
    pub fn for_endpoint(endpoint: Url) -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            hub: WsOptions::new(endpoint),
            hub_worker: hub::Options::default(),
            backend_base_url: "http://localhost:5000".to_string(),
            enable_server: false,
            server: ServerOptions::default(),
            roster: RosterOptions::default(),
            factories: default_factories(),
            trend_capacity: DEFAULT_TREND_CAPACITY,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

/// Lifecycle options for the monitor
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Roster options
#[derive(Debug, Clone)]
pub struct RosterOptions {
    /// Start from the placeholder machines
    pub seed: bool,

    pub on_reconnect: ReconnectPolicy,

    pub reconcile: ReconcileOptions,
}

impl Default for RosterOptions {
    fn default() -> Self {
        Self {
            seed: true,
            on_reconnect: ReconnectPolicy::Preserve,
            reconcile: ReconcileOptions::default(),
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8480,
        }
    }
}
