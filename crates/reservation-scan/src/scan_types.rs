use serde::{Deserialize, Serialize};

/// One bookable reservation time returned by the availability endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Unix timestamp of the reservation time
    #[serde(default)]
    pub timestamp: i64,
    /// Display time, e.g. "7:30 pm"
    #[serde(default)]
    pub formatted_time: String,
    /// Host-relative booking path used to build the deep link
    #[serde(default)]
    pub form_action: String,
    /// CSRF token the booking form expects
    #[serde(default)]
    pub csrf_token: Option<String>,
    /// Date of the slot as `YYYY-MM-DD`
    #[serde(default)]
    pub isodate: String,
}

/// Slots the endpoint returns for a single date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateGroup {
    /// Open slots on this date, in endpoint order
    #[serde(default, rename = "availability_list")]
    pub slots: Vec<Slot>,
    /// Date label as displayed by the endpoint
    #[serde(default)]
    pub date: String,
    /// Party size the slots were queried for
    #[serde(default)]
    pub covers: i64,
    /// Time of day the query asked for
    #[serde(default)]
    pub time: String,
    /// Unix timestamp of the queried date and time
    #[serde(default)]
    pub timestamp: i64,
    /// Message shown when no slots are available
    #[serde(default)]
    pub msg: String,
    /// Date in `YYYY-MM-DD` form
    #[serde(default)]
    pub isodate: String,
}

/// Decoded response of one availability query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    /// Whether the endpoint reported the query as successful
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    availability_data: Option<Vec<DateGroup>>,
    /// Slot matching the requested date and time exactly, if any
    #[serde(default)]
    pub exact_match: Option<Slot>,
    /// Whether the endpoint offers a "next available" lookup
    #[serde(default)]
    pub enable_next_available: bool,
}

impl AvailabilityResult {
    /// Builds a successful result from the given date groups.
    pub fn with_date_groups(date_groups: Vec<DateGroup>) -> Self {
        Self {
            success: true,
            availability_data: Some(date_groups),
            ..Self::default()
        }
    }

    /// Date groups in endpoint order. A missing or `null` list is empty.
    pub fn date_groups(&self) -> &[DateGroup] {
        self.availability_data.as_deref().unwrap_or_default()
    }

    /// Total number of open slots across all date groups
    pub fn open_slot_count(&self) -> usize {
        self.date_groups().iter().map(|group| group.slots.len()).sum()
    }
}

/// Custom error type for scan operations
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// API error
    #[error("API error: {0}")]
    ApiError(String),

    /// Rate limited by external API
    #[error("Rate limited by external API")]
    RateLimited,

    /// Authentication failed with external service
    #[error("Authentication failed with external service")]
    AuthenticationFailed,

    /// Availability endpoint not found
    #[error("Availability endpoint not found")]
    NotFound,

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Data format error
    #[error("Data format error: {0}")]
    DataFormat(String),
}
