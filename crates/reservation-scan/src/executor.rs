use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info};

use crate::alert_notifier::AlertNotifier;
use crate::config::{DEFAULT_POLL_INTERVAL_SECS, ScanConfig};
use crate::result_parser::parse_results;
use crate::scan_types::ScanError;
use crate::yelp_client::AvailabilitySource;

/// Timing of the poll loop
#[derive(Debug, Clone)]
pub struct ScanExecutorConfig {
    /// Pause between the end of one poll cycle and the start of the next (default: 60 seconds)
    pub poll_interval: Duration,
}

impl Default for ScanExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl From<&ScanConfig> for ScanExecutorConfig {
    fn from(config: &ScanConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
        }
    }
}

/// Counters reported when the poll loop stops
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanExecutorStats {
    /// Poll cycles started
    pub cycles: u64,
    /// Poll cycles that ended in an error
    pub failed_cycles: u64,
    /// Alerts handed to the notifier
    pub alerts_dispatched: u64,
}

/// Runs the fetch, parse and notify cycle on a fixed interval
pub struct ScanExecutor {
    source: Arc<dyn AvailabilitySource>,
    notifier: AlertNotifier,
    config: ScanExecutorConfig,
}

impl ScanExecutor {
    /// Create an executor; `None` uses the default [`ScanExecutorConfig`]
    pub fn new(
        source: Arc<dyn AvailabilitySource>,
        notifier: AlertNotifier,
        config: Option<ScanExecutorConfig>,
    ) -> Self {
        Self {
            source,
            notifier,
            config: config.unwrap_or_default(),
        }
    }

    /// Runs a single poll cycle and returns the number of alerts dispatched.
    pub async fn run_cycle(&self) -> Result<usize, ScanError> {
        info!("Checking reservation availability");

        let result = self.source.fetch_availability().await?;
        Ok(parse_results(&result, &self.notifier).await)
    }

    /// Polls until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Cycle errors are logged and never end the loop. A shutdown request
    /// interrupts the sleep between cycles but not a cycle in progress.
    pub async fn start(&self, mut shutdown: watch::Receiver<bool>) -> ScanExecutorStats {
        info!(
            "Starting reservation scan (interval: {:?})",
            self.config.poll_interval
        );

        let mut stats = ScanExecutorStats::default();

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            stats.cycles += 1;
            match self.run_cycle().await {
                Ok(alerts) => stats.alerts_dispatched += alerts as u64,
                Err(e) => {
                    stats.failed_cycles += 1;
                    error!("Error polling reservation availability: {}", e);
                }
            }

            let closed = tokio::select! {
                _ = sleep(self.config.poll_interval) => false,
                changed = shutdown.changed() => changed.is_err(),
            };
            if closed {
                break;
            }
        }

        info!(
            "Reservation scan stopped after {} cycles ({} failed, {} alerts)",
            stats.cycles, stats.failed_cycles, stats.alerts_dispatched
        );
        stats
    }
}
