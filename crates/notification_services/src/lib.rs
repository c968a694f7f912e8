//! # Notification Services
//!
//! This crate provides SMS delivery for reservation alerts.
//! It defines the provider-agnostic [`SmsService`] seam and a Twilio implementation.

/// SMS service trait and the Twilio REST implementation.
pub mod service;
/// Error and wire types used by the notification services.
pub mod types;

pub use service::{SmsService, TwilioSmsService};
pub use types::NotificationError;
