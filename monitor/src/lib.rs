//! Mokamon Library
//!
//! Live machine-status monitor for the factory dashboard: keeps a roster
//! fed by the production hub and derives per-factory counts from it.

pub mod aggregate;
pub mod app;
pub mod commands;
pub mod errors;
pub mod filesys;
pub mod handlers;
pub mod http;
pub mod hub;
pub mod logs;
pub mod notifications;
pub mod report;
pub mod roster;
pub mod server;
pub mod status;
pub mod storage;
pub mod utils;
pub mod workers;
