pub mod client;
pub mod customers;
pub mod orders;
