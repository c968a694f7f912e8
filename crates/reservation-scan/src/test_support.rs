//! Helpers shared by the unit tests of this crate.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use log::LevelFilter;
use notification_services::{NotificationError, SmsService};
use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::{ScanConfig, TwilioCredentials};

pub const DEST_NUMBER: &str = "+15551234567";

/// Configuration pointing at `query_url`, with the stock query defaults.
pub fn test_config(query_url: &str) -> ScanConfig {
    ScanConfig {
        query_url: Url::parse(query_url).unwrap(),
        date_offset_days: 60,
        days_before: 7,
        days_after: 7,
        party_size: 2,
        request_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
        twilio: TwilioCredentials {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15550000000".to_string(),
            dest_number: DEST_NUMBER.to_string(),
        },
        proxy_url: None,
        log_level: LevelFilter::Debug,
    }
}

/// Accepts one connection, captures the raw request and replies with `response`.
pub async fn serve_once(response: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&buf).to_string()
    });

    (format!("http://{}", addr), handle)
}

/// Accepts connections and never answers them.
pub async fn serve_silently() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    (format!("http://{}", addr), handle)
}

pub fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

/// SMS double that records every send and fails the calls listed in `fail_on`.
#[derive(Default)]
pub struct RecordingSms {
    pub sent: Mutex<Vec<(String, String)>>,
    pub attempts: Mutex<usize>,
    pub fail_on: Vec<usize>,
}

impl RecordingSms {
    pub fn failing_on(fail_on: Vec<usize>) -> Self {
        Self {
            fail_on,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub fn attempt_count(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl SmsService for RecordingSms {
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };

        if self.fail_on.contains(&attempt) {
            return Err(NotificationError::Provider {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }

        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), message.to_string()));
        Ok(format!("SM{:04}", attempt))
    }
}
