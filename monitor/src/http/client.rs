//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::MonitorError;

/// HTTP client for the REST backend
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Result<Self, MonitorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, MonitorError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = send("GET", self.client.get(&url)).await?;
        Ok(response.json().await?)
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, MonitorError> {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = send("POST", self.client.post(&url).json(body)).await?;
        Ok(response.json().await?)
    }

    /// Make a PUT request; the response body is ignored
    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<(), MonitorError> {
        let url = self.url(path);
        debug!("PUT {}", url);
        send("PUT", self.client.put(&url).json(body)).await?;
        Ok(())
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), MonitorError> {
        let url = self.url(path);
        debug!("DELETE {}", url);
        send("DELETE", self.client.delete(&url)).await?;
        Ok(())
    }
}

async fn send(method: &str, request: RequestBuilder) -> Result<reqwest::Response, MonitorError> {
    let response = request
        .header(header::ACCEPT, "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("HTTP {} failed: {} - {}", method, status, body);
        return Err(MonitorError::BackendError {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
