//! Mokametrics backend REST models

pub mod models;

pub use models::*;
