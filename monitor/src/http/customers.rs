//! Customers API client

use backend_models::{Customer, CustomerRequest};

use crate::errors::MonitorError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// List all customers
    pub async fn get_customers(&self) -> Result<Vec<Customer>, MonitorError> {
        self.get("/api/customers/").await
    }

    pub async fn get_customer(&self, id: u64) -> Result<Customer, MonitorError> {
        self.get(&format!("/api/customers/{}", id)).await
    }

    /// Create a customer, returning the stored record
    pub async fn create_customer(
        &self,
        customer: &CustomerRequest,
    ) -> Result<Customer, MonitorError> {
        self.post("/api/customers/", customer).await
    }

    pub async fn update_customer(
        &self,
        id: u64,
        customer: &CustomerRequest,
    ) -> Result<(), MonitorError> {
        self.put(&format!("/api/customers/{}", id), customer).await
    }

    pub async fn delete_customer(&self, id: u64) -> Result<(), MonitorError> {
        self.delete(&format!("/api/customers/{}", id)).await
    }
}
