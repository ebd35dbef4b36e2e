//! Push hub client: protocol, transport and connection state

pub mod connection;
pub mod dispatch;
pub mod events;
pub mod negotiate;
pub mod protocol;
pub mod transport;
pub mod websocket;
