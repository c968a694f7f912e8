//! # Reservation Scan
//!
//! This crate polls a reservation availability endpoint and turns every open
//! slot it reports into an SMS alert. It holds the runtime configuration, the
//! availability client, the result parser and the poll loop that ties them together.

/// Runtime configuration resolved from the environment
mod config;
pub use config::*;

/// Types for availability responses and scan errors
mod scan_types;
pub use scan_types::*;

/// HTTP client for the availability endpoint
mod yelp_client;
pub use yelp_client::*;

/// Turns availability results into alert messages
mod result_parser;
pub use result_parser::*;

/// Delivers alert messages over SMS
mod alert_notifier;
pub use alert_notifier::*;

/// Poll loop driving fetch, parse and notify
mod executor;
pub use executor::*;

#[cfg(test)]
mod test_support;
