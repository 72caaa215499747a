//! Keyguard Rotator
//!
//! Runs the key rotation scheduler until interrupted. Each check interval it
//! rotates the keys bound to due ACTIVE policies and records an audit event
//! per rotation attempt.
//!
//! The binary exposes no administration surface. Policies and keys are read
//! from the snapshot file at `KEYGUARD_STORE__PATH`, written by whatever
//! embeds `keyguard_keys::PolicyAdministration`. Without a store path the
//! rotator starts with an empty in-memory store and has nothing to rotate.

use anyhow::Result;
use keyguard_config::AppConfig;
use keyguard_keys::init_rotation_services;
use keyguard_logging::{init_logging, LogFormat};
use keyguard_rotator::RotationScheduler;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    let format: LogFormat = config
        .log
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    init_logging("keyguard-rotator", config.log_level(), format)?;

    info!("Starting Keyguard Rotator");
    info!(
        check_interval_secs = config.scheduler.check_interval_secs,
        rotation_timeout_secs = config.scheduler.rotation_timeout_secs,
        rollback_window_days = config.rotation.rollback_window_days,
        store = config.store.path.as_deref().unwrap_or("memory"),
        "Configuration loaded"
    );

    if !config.store.is_persistent() {
        warn!("KEYGUARD_STORE__PATH is not set; the in-memory store starts empty and no keys will be rotated");
    }

    let services = init_rotation_services(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize rotation services: {}", e))?;

    let scheduler = RotationScheduler::from_config(&services, &config.scheduler);
    scheduler
        .start(config.scheduler.check_interval())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start rotation scheduler: {}", e))?;

    // Wait for shutdown signal
    info!("Keyguard Rotator running. Press Ctrl+C to stop.");
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }

    scheduler.stop().await;
    info!("Keyguard Rotator stopped");

    Ok(())
}
