//! API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Customer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub company_fiscal_code: Option<String>,
}

/// Customer create/update request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_fiscal_code: Option<String>,
}

/// Production lot within an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    #[serde(default)]
    pub id: Option<u64>,
    pub lot_number: String,
    #[serde(default)]
    pub quantity: u32,
}

/// Order record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub customer_id: u64,
    #[serde(default)]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub quantity_machines: Option<u32>,
    #[serde(default)]
    pub lots: Vec<Lot>,
}

impl Order {
    /// Machine count of the order: the declared quantity, else the sum of lot quantities
    pub fn machine_count(&self) -> u32 {
        match self.quantity_machines {
            Some(quantity) if quantity > 0 => quantity,
            _ => self.lots.iter().map(|lot| lot.quantity).sum(),
        }
    }
}

/// New lot in an order request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotRequest {
    pub lot_number: String,
    pub quantity: u32,
}

/// Order create/update request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_id: u64,
    /// Requested date, formatted `YYYY-MM-DD`
    pub order_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub lots: Vec<LotRequest>,
}
