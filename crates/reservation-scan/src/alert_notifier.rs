use std::sync::Arc;

use notification_services::SmsService;
use tracing::{debug, error};

use crate::result_parser::AlertMessage;

/// Sends alert messages to a single destination number.
///
/// Delivery is best effort: failures are logged and swallowed so one
/// undeliverable alert never stops the rest of the cycle.
pub struct AlertNotifier {
    sms_service: Arc<dyn SmsService>,
    destination: String,
}

impl AlertNotifier {
    /// Create a notifier delivering through `sms_service` to `destination`
    pub fn new(sms_service: Arc<dyn SmsService>, destination: &str) -> Self {
        Self {
            sms_service,
            destination: destination.to_string(),
        }
    }

    /// Sends one alert. Errors are logged, never returned.
    pub async fn send_alert(&self, message: &AlertMessage) {
        match self
            .sms_service
            .send_sms(&self.destination, message.as_str())
            .await
        {
            Ok(message_id) => {
                debug!("Alert sent to {} (sid: {})", self.destination, message_id);
            }
            Err(e) => {
                error!("Failed to send alert to {}: {}", self.destination, e);
            }
        }
    }
}
