//! Error types for the factory monitor

use thiserror::Error;

/// Main error type for the factory monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Backend error: {status}: {body}")]
    BackendError { status: u16, body: String },

    #[error("Hub protocol error: {0}")]
    HubProtocolError(String),

    #[error("Negotiation error: {0}")]
    NegotiationError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Invalid connection transition: {0}")]
    TransitionError(String),

    #[error("Payload error: {0}")]
    PayloadError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
