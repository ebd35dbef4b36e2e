//! Notification feed for production events

pub mod orders;

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::errors::MonitorError;
use crate::roster::normalize::parse_payload;

pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 50;

/// One received notification
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Hub event name
    pub kind: String,
    pub received_at: DateTime<Utc>,
    pub payload: Value,
}

#[derive(Debug, Default)]
struct FeedState {
    items: VecDeque<Notification>,
    received: usize,
}

/// Bounded newest-first notification feed
#[derive(Debug)]
pub struct NotificationFeed {
    capacity: usize,
    state: Mutex<FeedState>,
}

impl NotificationFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(FeedState::default()),
        }
    }

    /// Record a raw payload; accepts an object or a JSON string holding one
    pub fn push_payload(
        &self,
        kind: &str,
        payload: &Value,
        received_at: DateTime<Utc>,
    ) -> Result<(), MonitorError> {
        let object = parse_payload(payload)?;
        self.push(Notification {
            kind: kind.to_string(),
            received_at,
            payload: Value::Object(object),
        });
        Ok(())
    }

    pub fn push(&self, notification: Notification) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.items.push_front(notification);
        state.items.truncate(self.capacity);
        state.received += 1;
    }

    /// Newest first
    pub fn list(&self) -> Vec<Notification> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.items.iter().cloned().collect()
    }

    /// Notifications received since start, including evicted ones
    pub fn received(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).received
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feed_is_bounded_and_newest_first() {
        let feed = NotificationFeed::new(2);
        let now = Utc::now();
        for lot in 1..=3 {
            feed.push_payload("lotCompleted", &json!({ "lotId": lot }), now)
                .unwrap();
        }

        let items = feed.list();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].payload["lotId"], 3);
        assert_eq!(items[1].payload["lotId"], 2);
        assert_eq!(feed.received(), 3);
    }

    #[test]
    fn test_feed_accepts_string_payload() {
        let feed = NotificationFeed::default();
        feed.push_payload(
            "orderFulfilled",
            &Value::String(r#"{"orderId": 9}"#.to_string()),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(feed.list()[0].payload["orderId"], 9);
    }

    #[test]
    fn test_feed_rejects_scalars() {
        let feed = NotificationFeed::default();
        assert!(feed.push_payload("lotCompleted", &json!(42), Utc::now()).is_err());
        assert!(feed.is_empty());
    }
}
