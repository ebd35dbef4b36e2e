//! Hub event names

/// Event names pushed by the hub
pub struct HubEvents;

impl HubEvents {
    /// Machine status update
    pub const STATUS: &'static str = "status";

    /// A production lot finished
    pub const LOT_COMPLETED: &'static str = "lotCompleted";

    /// An order was fulfilled
    pub const ORDER_FULFILLED: &'static str = "orderFulfilled";

    /// Events this client understands
    pub const KNOWN: [&'static str; 3] = [Self::STATUS, Self::LOT_COMPLETED, Self::ORDER_FULFILLED];

    /// Lookup key of an event name; hub targets match case-insensitively
    pub fn key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Check if an event name is one of [`HubEvents::KNOWN`]
    pub fn is_known(name: &str) -> bool {
        Self::KNOWN.iter().any(|known| known.eq_ignore_ascii_case(name))
    }
}
