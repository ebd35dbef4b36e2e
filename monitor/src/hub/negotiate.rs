//! Hub negotiation: discover the connection token and WebSocket URL

use reqwest::{header, Client};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::errors::MonitorError;

const MAX_REDIRECTS: usize = 5;

/// Negotiation response body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    #[serde(default)]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub connection_token: Option<String>,
    #[serde(default)]
    pub negotiate_version: Option<u32>,
    #[serde(default)]
    pub available_transports: Vec<AvailableTransport>,
    /// Redirect to another service, e.g. a hosted hub
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTransport {
    pub transport: String,
    #[serde(default)]
    pub transfer_formats: Vec<String>,
}

impl NegotiateResponse {
    fn supports_websockets(&self) -> bool {
        self.available_transports.iter().any(|t| {
            t.transport == "WebSockets" && t.transfer_formats.iter().any(|f| f == "Text")
        })
    }
}

/// Where and how to open the WebSocket
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiatedEndpoint {
    pub ws_url: Url,
    pub access_token: Option<String>,
}

/// `{endpoint}/negotiate?negotiateVersion=1` over HTTP(S)
pub fn negotiate_url(endpoint: &Url) -> Result<Url, MonitorError> {
    let mut url = with_scheme(endpoint, |scheme| match scheme {
        "http" | "ws" => Some("http"),
        "https" | "wss" => Some("https"),
        _ => None,
    })?;
    let path = format!("{}/negotiate", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut().append_pair("negotiateVersion", "1");
    Ok(url)
}

/// WebSocket URL of the hub, carrying the connection token when negotiated
pub fn websocket_url(endpoint: &Url, connection_token: Option<&str>) -> Result<Url, MonitorError> {
    let mut url = with_scheme(endpoint, |scheme| match scheme {
        "http" | "ws" => Some("ws"),
        "https" | "wss" => Some("wss"),
        _ => None,
    })?;
    if let Some(token) = connection_token {
        url.query_pairs_mut().append_pair("id", token);
    }
    Ok(url)
}

fn with_scheme(
    endpoint: &Url,
    map: impl Fn(&str) -> Option<&'static str>,
) -> Result<Url, MonitorError> {
    let scheme = map(endpoint.scheme()).ok_or_else(|| {
        MonitorError::ConfigError(format!("Unsupported hub URL scheme: {}", endpoint.scheme()))
    })?;
    let mut url = endpoint.clone();
    url.set_scheme(scheme)
        .map_err(|_| MonitorError::ConfigError("Failed to set scheme".to_string()))?;
    Ok(url)
}

/// Negotiate with the hub, following redirects
pub async fn negotiate(client: &Client, endpoint: &Url) -> Result<NegotiatedEndpoint, MonitorError> {
    let mut current = endpoint.clone();
    let mut access_token: Option<String> = None;

    for _ in 0..=MAX_REDIRECTS {
        let url = negotiate_url(&current)?;
        debug!("POST {}", url);

        let mut request = client.post(url);
        if let Some(token) = &access_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::NegotiationError(format!("{}: {}", status, body)));
        }

        let body: NegotiateResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(MonitorError::NegotiationError(error));
        }

        if let Some(redirect) = body.url {
            info!("Hub negotiation redirected to {}", redirect);
            current = Url::parse(&redirect)?;
            access_token = body.access_token;
            continue;
        }

        if !body.supports_websockets() {
            return Err(MonitorError::NegotiationError(
                "hub does not offer WebSockets with text transfer".to_string(),
            ));
        }

        let token = body.connection_token.or(body.connection_id);
        return Ok(NegotiatedEndpoint {
            ws_url: websocket_url(&current, token.as_deref())?,
            access_token,
        });
    }

    Err(MonitorError::NegotiationError(format!(
        "more than {} negotiation redirects",
        MAX_REDIRECTS
    )))
}
