use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy, Url};
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::scan_types::{AvailabilityResult, ScanError};

/// Host the availability endpoint and the booking deep links live on
pub const YELP_HOST: &str = "www.yelp.com";

/// Query parameters owned by the poller; any other parameter on the base URL is kept
pub const POLL_QUERY_PARAMS: [&str; 4] = ["date", "days_before", "days_after", "covers"];

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Source of availability results for the poll loop
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    /// Runs one availability query.
    async fn fetch_availability(&self) -> Result<AvailabilityResult, ScanError>;
}

/// Client for the Yelp reservations availability endpoint
pub struct YelpClient {
    client: Client,
    query_url: Url,
    date_offset_days: u64,
    days_before: u32,
    days_after: u32,
    party_size: u32,
}

impl YelpClient {
    /// Create a new availability client from the resolved configuration
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        let mut headers = HeaderMap::new();
        headers.insert("authority", HeaderValue::from_static(YELP_HOST));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.request_timeout);

        if let Some(ref proxy_url) = config.proxy_url {
            match Proxy::all(proxy_url.clone()) {
                Ok(proxy) => {
                    info!("Routing availability requests through proxy {}", proxy_url);
                    builder = builder.proxy(proxy);
                }
                Err(e) => {
                    warn!(
                        "Unable to use proxy {}: {}. Connecting directly",
                        proxy_url, e
                    );
                }
            }
        }

        let client = builder
            .build()
            .map_err(|e| ScanError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            query_url: config.query_url.clone(),
            date_offset_days: config.date_offset_days,
            days_before: config.days_before,
            days_after: config.days_after,
            party_size: config.party_size,
        })
    }

    /// Full request URL for a poll made on `today`
    pub fn request_url(&self, today: NaiveDate) -> Result<Url, ScanError> {
        let date = query_date(today, self.date_offset_days)?;
        Ok(build_query_url(
            &self.query_url,
            &date,
            self.days_before,
            self.days_after,
            self.party_size,
        ))
    }
}

#[async_trait]
impl AvailabilitySource for YelpClient {
    async fn fetch_availability(&self) -> Result<AvailabilityResult, ScanError> {
        let url = self.request_url(Local::now().date_naive())?;
        debug!("Fetching availability from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status();
            match status.as_u16() {
                429 => return Err(ScanError::RateLimited),
                401 | 403 => return Err(ScanError::AuthenticationFailed),
                404 => return Err(ScanError::NotFound),
                _ => return Err(ScanError::ApiError(format!("HTTP {}", status))),
            }
        }

        let body = response.text().await.map_err(transport_error)?;

        serde_json::from_str(&body)
            .map_err(|e| ScanError::DataFormat(format!("Failed to parse response: {}", e)))
    }
}

/// `today` plus `offset_days`, formatted `YYYY-MM-DD`
pub fn query_date(today: NaiveDate, offset_days: u64) -> Result<String, ScanError> {
    today
        .checked_add_days(Days::new(offset_days))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| {
            ScanError::DataFormat(format!(
                "Date offset of {} days from {} is out of range",
                offset_days, today
            ))
        })
}

/// Merges the poll parameters into `base`, keeping every other parameter in place.
pub fn build_query_url(
    base: &Url,
    date: &str,
    days_before: u32,
    days_after: u32,
    covers: u32,
) -> Url {
    let preserved: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(name, _)| !POLL_QUERY_PARAMS.contains(&&**name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(preserved.iter())
        .append_pair("date", date)
        .append_pair("days_before", &days_before.to_string())
        .append_pair("days_after", &days_after.to_string())
        .append_pair("covers", &covers.to_string());
    url
}

fn transport_error(e: reqwest::Error) -> ScanError {
    if e.is_timeout() {
        ScanError::Timeout(e.to_string())
    } else if e.is_builder() {
        ScanError::ApiError(format!("Failed to build request: {}", e))
    } else if e.is_decode() || e.is_body() {
        ScanError::DataFormat(format!("Failed to read response: {}", e))
    } else {
        ScanError::Network(e.to_string())
    }
}
