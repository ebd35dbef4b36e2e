//! Orders API client

use backend_models::{Order, OrderRequest};

use crate::errors::MonitorError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// List all orders
    pub async fn get_orders(&self) -> Result<Vec<Order>, MonitorError> {
        self.get("/api/orders/").await
    }

    pub async fn get_order(&self, id: u64) -> Result<Order, MonitorError> {
        self.get(&format!("/api/orders/{}", id)).await
    }

    /// Create an order, returning the stored record
    pub async fn create_order(&self, order: &OrderRequest) -> Result<Order, MonitorError> {
        self.post("/api/orders/", order).await
    }

    pub async fn update_order(&self, id: u64, order: &OrderRequest) -> Result<(), MonitorError> {
        self.put(&format!("/api/orders/{}", id), order).await
    }

    pub async fn delete_order(&self, id: u64) -> Result<(), MonitorError> {
        self.delete(&format!("/api/orders/{}", id)).await
    }
}
