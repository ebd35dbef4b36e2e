//! WebSocket transport for the hub

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use http::{header, HeaderValue};
use reqwest::Client;
use tokio::net::TcpStream;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::MonitorError;
use crate::hub::negotiate::{negotiate, websocket_url, NegotiatedEndpoint};
use crate::hub::protocol::{
    close_frame, handshake_request, parse_handshake_response, parse_message, ping_frame,
    split_records, HubMessage, RECORD_SEPARATOR,
};
use crate::hub::transport::{HubConnector, HubSession};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket connector options
#[derive(Debug, Clone)]
pub struct WsOptions {
    /// Hub endpoint, e.g. `https://host/productionHub`
    pub endpoint: Url,

    /// Connect straight to the WebSocket without negotiating
    pub skip_negotiation: bool,

    /// Interval between client pings
    pub keep_alive_interval: Duration,

    /// Silence after which the session counts as lost
    pub server_timeout: Duration,

    /// Deadline for the handshake answer
    pub handshake_timeout: Duration,
}

impl WsOptions {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            skip_negotiation: false,
            keep_alive_interval: Duration::from_secs(15),
            server_timeout: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(15),
        }
    }
}

/// Connector that negotiates and opens WebSocket sessions
pub struct WsConnector {
    http: Client,
    options: WsOptions,
    endpoint: String,
}

impl WsConnector {
    pub fn new(options: WsOptions) -> Result<Self, MonitorError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint: options.endpoint.to_string(),
            options,
        })
    }

    async fn resolve(&self) -> Result<NegotiatedEndpoint, MonitorError> {
        if self.options.skip_negotiation {
            return Ok(NegotiatedEndpoint {
                ws_url: websocket_url(&self.options.endpoint, None)?,
                access_token: None,
            });
        }
        negotiate(&self.http, &self.options.endpoint).await
    }
}

#[async_trait]
impl HubConnector for WsConnector {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn connect(&self) -> Result<Box<dyn HubSession>, MonitorError> {
        let target = self.resolve().await?;
        debug!("Opening hub socket: {}", target.ws_url);

        let mut request = target.ws_url.as_str().into_client_request()?;
        if let Some(token) = &target.access_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| MonitorError::ConnectionError(e.to_string()))?;
            request.headers_mut().insert(header::AUTHORIZATION, value);
        }

        let (mut stream, _) = connect_async(request).await?;
        stream.send(Message::Text(handshake_request().into())).await?;

        let pending = tokio::time::timeout(self.options.handshake_timeout, read_handshake(&mut stream))
            .await
            .map_err(|_| MonitorError::ConnectionError("handshake timed out".to_string()))??;

        info!("Hub handshake completed");
        Ok(Box::new(WsSession::new(
            stream,
            pending,
            self.options.keep_alive_interval,
            self.options.server_timeout,
        )))
    }
}

/// Wait for the handshake answer; records that arrive in the same frame are kept
async fn read_handshake(stream: &mut WsStream) -> Result<VecDeque<HubMessage>, MonitorError> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let text = text.as_str();
                let Some((answer, rest)) = text.split_once(RECORD_SEPARATOR) else {
                    return Err(MonitorError::HubProtocolError(
                        "unterminated handshake response".to_string(),
                    ));
                };
                parse_handshake_response(answer)?;
                return Ok(decode_records(rest));
            }
            Some(Ok(Message::Close(frame))) => {
                return Err(MonitorError::ConnectionError(format!(
                    "closed during handshake: {:?}",
                    frame
                )));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
            None => {
                return Err(MonitorError::ConnectionError(
                    "socket ended during handshake".to_string(),
                ))
            }
        }
    }
}

fn decode_records(text: &str) -> VecDeque<HubMessage> {
    split_records(text)
        .filter_map(|record| match parse_message(record) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("Dropping hub record: {}", e);
                None
            }
        })
        .collect()
}

/// Established WebSocket hub session
pub struct WsSession {
    stream: WsStream,
    pending: VecDeque<HubMessage>,
    keep_alive: Interval,
    server_timeout: Duration,
    last_received: Instant,
}

impl WsSession {
    fn new(
        stream: WsStream,
        pending: VecDeque<HubMessage>,
        keep_alive_interval: Duration,
        server_timeout: Duration,
    ) -> Self {
        let mut keep_alive =
            tokio::time::interval_at(Instant::now() + keep_alive_interval, keep_alive_interval);
        keep_alive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            stream,
            pending,
            keep_alive,
            server_timeout,
            last_received: Instant::now(),
        }
    }
}

#[async_trait]
impl HubSession for WsSession {
    async fn next_message(&mut self) -> Result<Option<HubMessage>, MonitorError> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Ok(Some(message));
            }

            let deadline = self.last_received + self.server_timeout;

            tokio::select! {
                _ = self.keep_alive.tick() => {
                    self.stream.send(Message::Text(ping_frame().into())).await?;
                }
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(MonitorError::ConnectionError(format!(
                        "no message from hub within {:?}",
                        self.server_timeout
                    )));
                }
                frame = self.stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.last_received = Instant::now();
                            self.pending.extend(decode_records(text.as_str()));
                        }
                        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                            self.last_received = Instant::now();
                        }
                        Some(Ok(Message::Binary(_))) => {
                            warn!("Ignoring binary frame on a JSON hub session");
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            return Ok(None);
                        }
                        Some(Ok(Message::Frame(_))) => {}
                        Some(Err(e)) => return Err(e.into()),
                    }
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), MonitorError> {
        if let Err(e) = self.stream.send(Message::Text(close_frame().into())).await {
            debug!("Hub close message not sent: {}", e);
        }
        self.stream.close(None).await?;
        Ok(())
    }
}
