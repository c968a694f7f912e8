use crate::types::*;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Default base URL of the Twilio REST API.
pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Trait for SMS service implementations
#[async_trait]
pub trait SmsService: Send + Sync {
    /// Sends `message` to `to` and returns the provider-assigned message id.
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError>;
}

/// SMS service backed by the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct TwilioSmsService {
    client: Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSmsService {
    /// Creates a new Twilio service authenticating with the given account credentials.
    pub fn new(
        account_sid: &str,
        auth_token: &str,
        from_number: &str,
    ) -> Result<Self, NotificationError> {
        Self::with_api_base(TWILIO_API_BASE, account_sid, auth_token, from_number)
    }

    /// Creates a Twilio service that talks to a different API host.
    pub fn with_api_base(
        api_base: &str,
        account_sid: &str,
        auth_token: &str,
        from_number: &str,
    ) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                NotificationError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            from_number: from_number.to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl SmsService for TwilioSmsService {
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", to),
                ("From", self.from_number.as_str()),
                ("Body", message),
            ])
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = provider_error_message(&body).unwrap_or(body);
            log::error!("Twilio rejected message to {}: HTTP {}", to, status);
            return Err(NotificationError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let created: TwilioMessageResponse = response
            .json()
            .await
            .map_err(|e| NotificationError::InvalidResponse(e.to_string()))?;

        log::debug!(
            "Twilio accepted message {} (status: {})",
            created.sid,
            created.status.as_deref().unwrap_or("unknown")
        );
        Ok(created.sid)
    }
}

/// Extracts the `message` field of a Twilio error body, if it is one.
fn provider_error_message(body: &str) -> Option<String> {
    let parsed: TwilioErrorResponse = serde_json::from_str(body).ok()?;
    match (parsed.code, parsed.message) {
        (Some(code), Some(message)) => Some(format!("{} (code {})", message, code)),
        (None, Some(message)) => Some(message),
        _ => None,
    }
}
