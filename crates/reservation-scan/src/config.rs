use std::{env, fmt, str::FromStr, time::Duration};

use log::LevelFilter;
use reqwest::{Proxy, Url};
use validator::{Validate, ValidationErrors};

/// Default number of days between today and the queried date
pub const DEFAULT_DATE_OFFSET_DAYS: u64 = 60;
/// Default size of the search window on either side of the queried date
pub const DEFAULT_DAYS_WINDOW: u32 = 7;
/// Default party size
pub const DEFAULT_PARTY_SIZE: u32 = 2;
/// Default pause between poll cycles, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
/// Default availability request timeout, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Log level used when `LOG_LEVEL` is unset or invalid
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Credentials and numbers for the SMS provider
#[derive(Debug, Clone)]
pub struct TwilioCredentials {
    /// Twilio account SID, also the basic-auth user
    pub account_sid: String,
    /// Twilio auth token
    pub auth_token: String,
    /// Number alerts are sent from
    pub from_number: String,
    /// Number alerts are sent to
    pub dest_number: String,
}

/// Immutable runtime configuration, built once at startup
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Availability endpoint, possibly carrying its own query parameters
    pub query_url: Url,
    /// Days from today to the queried date
    pub date_offset_days: u64,
    /// Days before the queried date to include
    pub days_before: u32,
    /// Days after the queried date to include
    pub days_after: u32,
    /// Party size (`covers`)
    pub party_size: u32,
    /// Bound on a single availability request
    pub request_timeout: Duration,
    /// Pause between poll cycles
    pub poll_interval: Duration,
    /// SMS provider settings
    pub twilio: TwilioCredentials,
    /// Forward proxy for availability requests
    pub proxy_url: Option<Url>,
    /// Logging verbosity
    pub log_level: LevelFilter,
}

/// A configuration problem that was worked around instead of aborting startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// `PROXY_URL` could not be used; requests go out directly.
    InvalidProxyUrl {
        /// Configured value
        value: String,
        /// Why it was rejected
        reason: String,
    },
    /// `LOG_LEVEL` is not a known level; the default level is used.
    InvalidLogLevel {
        /// Configured value
        value: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::InvalidProxyUrl { value, reason } => write!(
                f,
                "unable to parse PROXY_URL {:?} ({}), connecting directly",
                value, reason
            ),
            ConfigWarning::InvalidLogLevel { value } => write!(
                f,
                "unknown LOG_LEVEL {:?}, falling back to {}",
                value, DEFAULT_LOG_LEVEL
            ),
        }
    }
}

/// Configuration errors that abort startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// One or more required variables are unset or empty
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// A numeric variable does not hold a usable number
    #[error("{name} must be a positive number, got {value:?}")]
    InvalidNumber {
        /// Variable name
        name: &'static str,
        /// Configured value
        value: String,
    },

    /// The availability endpoint URL cannot be parsed
    #[error("Unable to parse YELP_QUERY_URL {value:?}: {reason}")]
    InvalidQueryUrl {
        /// Configured value
        value: String,
        /// Parser error
        reason: String,
    },
}

/// Fully resolved configuration plus every fallback that was applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Configuration to run with
    pub config: ScanConfig,
    /// Degraded-mode conditions to report once logging is up
    pub warnings: Vec<ConfigWarning>,
}

/// Variables that must be present and non-empty
#[derive(Debug, Validate)]
struct RequiredSettings {
    #[validate(length(min = 1, message = "TWILIO_ACCOUNT_SID"))]
    twilio_account_sid: String,
    #[validate(length(min = 1, message = "TWILIO_AUTH_TOKEN"))]
    twilio_auth_token: String,
    #[validate(length(min = 1, message = "TWILIO_FROM"))]
    twilio_from: String,
    #[validate(length(min = 1, message = "TWILIO_DEST"))]
    twilio_dest: String,
    #[validate(length(min = 1, message = "YELP_QUERY_URL"))]
    yelp_query_url: String,
}

impl ScanConfig {
    /// Resolves the configuration from the process environment.
    pub fn from_env() -> Result<ResolvedConfig, ConfigError> {
        Self::resolve(|name| env::var(name).ok())
    }

    /// Resolves the configuration from an arbitrary variable lookup.
    ///
    /// Hard failures (missing values, bad numbers, bad endpoint URL) are
    /// returned as [`ConfigError`]; an unusable proxy or log level is replaced
    /// by its fallback and reported in [`ResolvedConfig::warnings`].
    pub fn resolve<F>(lookup: F) -> Result<ResolvedConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        let required = RequiredSettings {
            twilio_account_sid: var("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: var("TWILIO_AUTH_TOKEN"),
            twilio_from: var("TWILIO_FROM"),
            twilio_dest: var("TWILIO_DEST"),
            yelp_query_url: var("YELP_QUERY_URL"),
        };
        required
            .validate()
            .map_err(|errors| ConfigError::Missing(missing_fields(&errors)))?;

        let query_url =
            Url::parse(&required.yelp_query_url).map_err(|e| ConfigError::InvalidQueryUrl {
                value: required.yelp_query_url.clone(),
                reason: e.to_string(),
            })?;

        let date_offset_days = number_or(&var, "YELP_QUERY_DATE_OFFSET", DEFAULT_DATE_OFFSET_DAYS)?;
        let days_before = number_or(&var, "YELP_QUERY_DAYS_BEFORE", DEFAULT_DAYS_WINDOW)?;
        let days_after = number_or(&var, "YELP_QUERY_DAYS_AFTER", DEFAULT_DAYS_WINDOW)?;
        let party_size = positive_or(&var, "YELP_QUERY_PARTY_SIZE", DEFAULT_PARTY_SIZE)?;
        let poll_interval_secs =
            positive_or(&var, "QUERY_INTERVAL_SECONDS", DEFAULT_POLL_INTERVAL_SECS)?;
        let request_timeout_secs =
            positive_or(&var, "TIMEOUT_SECONDS", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        let mut warnings = Vec::new();

        let proxy_value = var("PROXY_URL");
        let proxy_url = if proxy_value.is_empty() {
            None
        } else {
            match validate_proxy_url(&proxy_value) {
                Ok(url) => Some(url),
                Err(reason) => {
                    warnings.push(ConfigWarning::InvalidProxyUrl {
                        value: proxy_value,
                        reason,
                    });
                    None
                }
            }
        };

        let level_value = var("LOG_LEVEL");
        let log_level = if level_value.is_empty() {
            DEFAULT_LOG_LEVEL
        } else {
            log_level_alias(&level_value)
                .parse::<LevelFilter>()
                .unwrap_or_else(|_| {
                    warnings.push(ConfigWarning::InvalidLogLevel {
                        value: level_value.clone(),
                    });
                    DEFAULT_LOG_LEVEL
                })
        };

        let config = ScanConfig {
            query_url,
            date_offset_days,
            days_before,
            days_after,
            party_size,
            request_timeout: Duration::from_secs(request_timeout_secs),
            poll_interval: Duration::from_secs(poll_interval_secs),
            twilio: TwilioCredentials {
                account_sid: required.twilio_account_sid,
                auth_token: required.twilio_auth_token,
                from_number: required.twilio_from,
                dest_number: required.twilio_dest,
            },
            proxy_url,
            log_level,
        };

        Ok(ResolvedConfig { config, warnings })
    }
}

/// Names of the required variables that failed validation, sorted for stable output
fn missing_fields(errors: &ValidationErrors) -> String {
    let mut missing: Vec<String> = errors
        .field_errors()
        .values()
        .flat_map(|field_errors| field_errors.iter())
        .filter_map(|error| error.message.as_ref().map(|message| message.to_string()))
        .collect();
    missing.sort();
    missing.join(", ")
}

fn number_or<T, V>(var: &V, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    V: Fn(&str) -> String,
{
    let value = var(name);
    if value.is_empty() {
        return Ok(default);
    }
    value
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { name, value })
}

fn positive_or<T, V>(var: &V, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
    V: Fn(&str) -> String,
{
    let parsed = number_or(var, name, default)?;
    if parsed == T::default() {
        return Err(ConfigError::InvalidNumber {
            name,
            value: var(name),
        });
    }
    Ok(parsed)
}

/// Maps level names used by other loggers onto the nearest `LevelFilter` name.
fn log_level_alias(value: &str) -> &str {
    match value.to_ascii_lowercase().as_str() {
        "warning" => "warn",
        "fatal" | "panic" => "error",
        _ => value,
    }
}

fn validate_proxy_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    Proxy::all(url.clone()).map_err(|e| e.to_string())?;
    Ok(url)
}
