//! Core domain + application logic for the price Telegram bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the HTTP price
//! providers live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod interval;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod price;
pub mod registry;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
