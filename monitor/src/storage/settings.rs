//! Settings file management

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::{default_factories, FactoryDefinition};
use crate::aggregate::trend::DEFAULT_TREND_CAPACITY;
use crate::errors::MonitorError;
use crate::filesys::file::File;
use crate::logs::LogLevel;
use crate::notifications::DEFAULT_NOTIFICATION_CAPACITY;
use crate::roster::ReconnectPolicy;

pub const ENV_HUB_URL: &str = "MOKAMON_HUB_URL";
pub const ENV_BACKEND_URL: &str = "MOKAMON_BACKEND_URL";
pub const ENV_LOG_LEVEL: &str = "MOKAMON_LOG_LEVEL";

/// Monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Push hub connection
    #[serde(default)]
    pub hub: HubSettings,

    /// REST backend
    #[serde(default)]
    pub backend: BackendSettings,

    /// Local JSON API
    #[serde(default)]
    pub server: ServerSettings,

    /// Roster behavior
    #[serde(default)]
    pub roster: RosterSettings,

    /// Factories shown in the aggregates, in display order
    #[serde(default = "default_factories")]
    pub factories: Vec<FactoryDefinition>,

    /// Points kept in the operational trend
    #[serde(default = "default_trend_capacity")]
    pub trend_capacity: usize,

    /// Notifications kept in the feed
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

fn default_true() -> bool {
    true
}

fn default_trend_capacity() -> usize {
    DEFAULT_TREND_CAPACITY
}

fn default_notification_capacity() -> usize {
    DEFAULT_NOTIFICATION_CAPACITY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            hub: HubSettings::default(),
            backend: BackendSettings::default(),
            server: ServerSettings::default(),
            roster: RosterSettings::default(),
            factories: default_factories(),
            trend_capacity: DEFAULT_TREND_CAPACITY,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl Settings {
    /// Read the settings file; a missing file yields the defaults
    pub async fn load(file: &File) -> Result<Self, MonitorError> {
        if !file.exists().await {
            warn!(
                "Settings file {} not found, using defaults",
                file.path().display()
            );
            return Ok(Self::default());
        }
        info!("Loading settings from {}", file.path().display());
        file.read_json::<Settings>().await
    }

    /// Apply `MOKAMON_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_HUB_URL).filter(|v| !v.trim().is_empty()) {
            self.hub.url = url;
        }
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            self.backend.base_url = url;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            match level.parse::<LogLevel>() {
                Ok(level) => self.log_level = level,
                Err(e) => warn!("Ignoring {}: {}", ENV_LOG_LEVEL, e),
            }
        }
        self
    }
}

/// Push hub settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSettings {
    /// Hub endpoint
    #[serde(default = "default_hub_url")]
    pub url: String,

    /// Connect straight to the WebSocket endpoint
    #[serde(default)]
    pub skip_negotiation: bool,

    /// Delays before each automatic reconnection attempt
    #[serde(default = "default_reconnect_delays")]
    pub reconnect_delays_secs: Vec<u64>,

    /// First delay of the manual retry backoff
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_secs: u64,

    /// Cap of the manual retry backoff
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_secs: u64,

    /// Client ping interval
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Silence after which the session is considered lost
    #[serde(default = "default_server_timeout")]
    pub server_timeout_secs: u64,
}

fn default_hub_url() -> String {
    "http://localhost:5000/productionHub".to_string()
}

fn default_reconnect_delays() -> Vec<u64> {
    vec![0, 2, 10, 30]
}

fn default_retry_base_delay() -> u64 {
    2
}

fn default_retry_max_delay() -> u64 {
    60
}

fn default_keep_alive() -> u64 {
    15
}

fn default_server_timeout() -> u64 {
    30
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            url: default_hub_url(),
            skip_negotiation: false,
            reconnect_delays_secs: default_reconnect_delays(),
            retry_base_delay_secs: default_retry_base_delay(),
            retry_max_delay_secs: default_retry_max_delay(),
            keep_alive_secs: default_keep_alive(),
            server_timeout_secs: default_server_timeout(),
        }
    }
}

/// REST backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the backend API
    #[serde(default = "default_backend_url")]
    pub base_url: String,
}

fn default_backend_url() -> String {
    "http://localhost:5000".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
        }
    }
}

/// Local JSON API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8480
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Roster settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterSettings {
    /// Start from the placeholder machines
    #[serde(default = "default_true")]
    pub seed: bool,

    #[serde(default)]
    pub on_reconnect: ReconnectPolicy,

    /// Match updates by key only
    #[serde(default)]
    pub strict_identity: bool,
}

impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            seed: true,
            on_reconnect: ReconnectPolicy::Preserve,
            strict_identity: false,
        }
    }
}
