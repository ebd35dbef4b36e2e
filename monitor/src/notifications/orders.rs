//! Order activity rendered as event log rows

use std::cmp::Reverse;

use backend_models::{Customer, Order};
use chrono::{DateTime, Utc};

/// Number of orders shown in the event log
pub const ORDER_EVENT_LIMIT: usize = 5;

/// Row of the event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEvent {
    pub severity: &'static str,
    pub time: Option<DateTime<Utc>>,
    /// Customer the order belongs to
    pub source: String,
    pub message: String,
}

/// Build event rows for the most recent orders
pub fn order_events(orders: &[Order], customers: &[Customer]) -> Vec<OrderEvent> {
    let mut recent: Vec<&Order> = orders.iter().collect();
    // undated orders sort last
    recent.sort_by_key(|order| Reverse((order.order_date, order.id)));

    recent
        .into_iter()
        .take(ORDER_EVENT_LIMIT)
        .map(|order| OrderEvent {
            severity: "Info",
            time: order.order_date,
            source: customer_label(order.customer_id, customers),
            message: format!("Order #{} - {} machines", order.id, order.machine_count()),
        })
        .collect()
}

fn customer_label(customer_id: u64, customers: &[Customer]) -> String {
    customers
        .iter()
        .find(|customer| customer.id == customer_id)
        .map(|customer| customer.name.clone())
        .unwrap_or_else(|| format!("Customer {}", customer_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_models::Lot;
    use chrono::TimeZone;

    fn order(id: u64, customer_id: u64, day: Option<u32>, quantity: Option<u32>) -> Order {
        Order {
            id,
            customer_id,
            order_date: day.map(|d| Utc.with_ymd_and_hms(2025, 3, d, 9, 0, 0).unwrap()),
            deadline: None,
            quantity_machines: quantity,
            lots: vec![
                Lot {
                    id: None,
                    lot_number: "L-1".to_string(),
                    quantity: 2,
                },
                Lot {
                    id: None,
                    lot_number: "L-2".to_string(),
                    quantity: 3,
                },
            ],
        }
    }

    fn customer(id: u64, name: &str) -> Customer {
        Customer {
            id,
            name: name.to_string(),
            email: None,
            phone: None,
            address: None,
            city: None,
            country: None,
            zip_code: None,
            company_fiscal_code: None,
        }
    }

    #[test]
    fn test_order_event_rows() {
        let orders = vec![order(1, 10, Some(1), Some(4)), order(2, 11, Some(2), None)];
        let customers = vec![customer(10, "Acme")];

        let events = order_events(&orders, &customers);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "Order #2 - 5 machines");
        assert_eq!(events[0].source, "Customer 11");
        assert_eq!(events[1].message, "Order #1 - 4 machines");
        assert_eq!(events[1].source, "Acme");
        assert_eq!(events[1].severity, "Info");
    }

    #[test]
    fn test_order_events_keep_five_most_recent() {
        let mut orders: Vec<Order> = (1..=7).map(|i| order(i, 1, Some(i as u32), Some(1))).collect();
        orders.push(order(99, 1, None, Some(1)));

        let events = order_events(&orders, &[]);
        let ids: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(events.len(), ORDER_EVENT_LIMIT);
        assert_eq!(ids[0], "Order #7 - 1 machines");
        assert_eq!(ids[4], "Order #3 - 1 machines");
    }
}
