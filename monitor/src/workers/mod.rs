pub mod aggregator;
pub mod hub;
