//! Main entry point for the reservation watcher.
//! Polls the availability endpoint and texts every open slot until interrupted.

use std::sync::Arc;

use anyhow::Context;
use notification_services::{SmsService, TwilioSmsService};
use reservation_scan::*;
use tokio::sync::watch;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let resolved = match ScanConfig::from_env() {
        Ok(resolved) => resolved,
        Err(e) => {
            env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
            log::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logger
    env_logger::init_from_env(
        env_logger::Env::new().default_filter_or(resolved.config.log_level.to_string()),
    );

    for warning in &resolved.warnings {
        log::warn!("⚠️ {}", warning);
    }

    let config = resolved.config;
    log::info!("🚀 Starting reservation watcher...");
    log::info!(
        "🍽️ Party of {}, {} days out (±{}/{} days), every {:?}",
        config.party_size,
        config.date_offset_days,
        config.days_before,
        config.days_after,
        config.poll_interval
    );

    let yelp_client =
        YelpClient::new(&config).context("failed to create availability client")?;

    let sms_service: Arc<dyn SmsService> = Arc::new(
        TwilioSmsService::new(
            &config.twilio.account_sid,
            &config.twilio.auth_token,
            &config.twilio.from_number,
        )
        .context("failed to create SMS service")?,
    );
    let notifier = AlertNotifier::new(sms_service, &config.twilio.dest_number);

    let executor = ScanExecutor::new(
        Arc::new(yelp_client),
        notifier,
        Some(ScanExecutorConfig::from(&config)),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("🛑 Shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                log::error!("❌ Unable to listen for shutdown signal: {}", e);
                // Hold the sender so the poll loop keeps running
                std::future::pending::<()>().await;
            }
        }
    });

    let stats = executor.start(shutdown_rx).await;
    log::info!(
        "👋 Reservation watcher exiting after {} cycles",
        stats.cycles
    );

    Ok(())
}
