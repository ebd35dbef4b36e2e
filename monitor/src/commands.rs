//! One-shot backend commands of the command line

use std::collections::HashMap;

use backend_models::{CustomerRequest, OrderRequest};
use serde::de::DeserializeOwned;

use crate::errors::MonitorError;
use crate::http::client::HttpClient;
use crate::report::{render_customers, render_orders};

/// Command line keys that select a backend command
pub const BACKEND_KEYS: [&str; 10] = [
    "orders",
    "customers",
    "order",
    "customer",
    "create-order",
    "update-order",
    "delete-order",
    "create-customer",
    "update-customer",
    "delete-customer",
];

/// Orders and customers operations against the REST backend
#[derive(Debug, Clone)]
pub enum BackendCommand {
    ListOrders,
    ListCustomers,
    ShowOrder(u64),
    ShowCustomer(u64),
    CreateOrder(OrderRequest),
    UpdateOrder(u64, OrderRequest),
    DeleteOrder(u64),
    CreateCustomer(CustomerRequest),
    UpdateCustomer(u64, CustomerRequest),
    DeleteCustomer(u64),
}

impl BackendCommand {
    /// Pick the command from `--key=value` arguments
    ///
    /// `body` is the JSON document named by `--body=<path>`, required by the
    /// create and update commands. Returns `Ok(None)` when no backend key is set.
    pub fn from_args(
        args: &HashMap<String, String>,
        body: Option<&str>,
    ) -> Result<Option<Self>, MonitorError> {
        let Some(key) = BACKEND_KEYS.iter().find(|key| args.contains_key(**key)) else {
            return Ok(None);
        };
        let value = args.get(*key).map(String::as_str).unwrap_or_default();

        let command = match *key {
            "orders" => Self::ListOrders,
            "customers" => Self::ListCustomers,
            "order" => Self::ShowOrder(parse_id(key, value)?),
            "customer" => Self::ShowCustomer(parse_id(key, value)?),
            "create-order" => Self::CreateOrder(parse_body(key, body)?),
            "update-order" => Self::UpdateOrder(parse_id(key, value)?, parse_body(key, body)?),
            "delete-order" => Self::DeleteOrder(parse_id(key, value)?),
            "create-customer" => Self::CreateCustomer(parse_body(key, body)?),
            "update-customer" => {
                Self::UpdateCustomer(parse_id(key, value)?, parse_body(key, body)?)
            }
            _ => Self::DeleteCustomer(parse_id(key, value)?),
        };
        Ok(Some(command))
    }

    /// Run the command, returning the text to print
    pub async fn execute(&self, client: &HttpClient) -> Result<String, MonitorError> {
        let output = match self {
            Self::ListOrders => {
                let (orders, customers) = tokio::join!(client.get_orders(), client.get_customers());
                render_orders(&orders?, &customers?)
            }
            Self::ListCustomers => render_customers(&client.get_customers().await?),
            Self::ShowOrder(id) => pretty(&client.get_order(*id).await?)?,
            Self::ShowCustomer(id) => pretty(&client.get_customer(*id).await?)?,
            Self::CreateOrder(request) => pretty(&client.create_order(request).await?)?,
            Self::UpdateOrder(id, request) => {
                client.update_order(*id, request).await?;
                format!("Order #{} updated\n", id)
            }
            Self::DeleteOrder(id) => {
                client.delete_order(*id).await?;
                format!("Order #{} deleted\n", id)
            }
            Self::CreateCustomer(request) => pretty(&client.create_customer(request).await?)?,
            Self::UpdateCustomer(id, request) => {
                client.update_customer(*id, request).await?;
                format!("Customer #{} updated\n", id)
            }
            Self::DeleteCustomer(id) => {
                client.delete_customer(*id).await?;
                format!("Customer #{} deleted\n", id)
            }
        };
        Ok(output)
    }
}

fn parse_id(key: &str, value: &str) -> Result<u64, MonitorError> {
    value
        .parse()
        .map_err(|_| MonitorError::ConfigError(format!("--{key} expects a numeric id, got '{value}'")))
}

fn parse_body<T: DeserializeOwned>(key: &str, body: Option<&str>) -> Result<T, MonitorError> {
    let body = body
        .ok_or_else(|| MonitorError::ConfigError(format!("--{key} requires --body=<path>")))?;
    Ok(serde_json::from_str(body)?)
}

fn pretty<T: serde::Serialize>(value: &T) -> Result<String, MonitorError> {
    Ok(format!("{}\n", serde_json::to_string_pretty(value)?))
}
