use serde::Deserialize;

/// Errors raised while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The HTTP request to the provider could not be completed.
    #[error("SMS transport error: {0}")]
    Transport(String),

    /// The provider rejected the message.
    #[error("SMS provider error (HTTP {status}): {message}")]
    Provider {
        /// HTTP status returned by the provider.
        status: u16,
        /// Error message reported by the provider, or the raw body.
        message: String,
    },

    /// The provider accepted the request but the response could not be read.
    #[error("Unexpected SMS provider response: {0}")]
    InvalidResponse(String),
}

/// Subset of the Twilio message resource returned on a successful send.
#[derive(Debug, Deserialize)]
pub struct TwilioMessageResponse {
    /// Provider-assigned message identifier.
    pub sid: String,
    /// Delivery status at creation time, e.g. `queued`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body returned by the Twilio REST API.
#[derive(Debug, Deserialize)]
pub struct TwilioErrorResponse {
    /// Twilio error code
    #[serde(default)]
    pub code: Option<i64>,
    /// Human-readable error message
    #[serde(default)]
    pub message: Option<String>,
}
