//! Transport seam between the hub worker and the network

use async_trait::async_trait;

use crate::errors::MonitorError;
use crate::hub::protocol::HubMessage;

/// Opens hub sessions
#[async_trait]
pub trait HubConnector: Send + Sync {
    /// Human-readable endpoint, for logs
    fn endpoint(&self) -> &str;

    /// Open a session and complete the protocol handshake
    async fn connect(&self) -> Result<Box<dyn HubSession>, MonitorError>;
}

/// One established hub session
#[async_trait]
pub trait HubSession: Send {
    /// Next decoded message; `Ok(None)` once the server closed the socket
    async fn next_message(&mut self) -> Result<Option<HubMessage>, MonitorError>;

    /// Release the session
    async fn close(&mut self) -> Result<(), MonitorError>;
}
