//! Configuration management for Keyguard services
//!
//! Values come from built-in defaults, overridden by environment variables
//! prefixed with `KEYGUARD_` where `__` separates nested keys, for example
//! `KEYGUARD_SCHEDULER__CHECK_INTERVAL_SECS=600`.

use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Rotation scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    pub check_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub error_backoff_max_secs: u64,
    pub error_backoff_multiplier: f64,
    pub rotation_timeout_secs: u64,
    /// Restrict the sweep to a single tenant
    pub tenant_id: Option<Uuid>,
}

impl SchedulerConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn rotation_timeout(&self) -> Duration {
        Duration::from_secs(self.rotation_timeout_secs)
    }
}

/// Longest accepted rollback window (ten years)
pub const MAX_ROLLBACK_WINDOW_DAYS: u32 = 3650;

/// Policy and key store configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// JSON snapshot file; in-memory when unset
    pub path: Option<String>,
}

impl StoreConfig {
    /// Whether policies and keys outlive the process
    pub fn is_persistent(&self) -> bool {
        self.path.as_deref().map_or(false, |path| !path.trim().is_empty())
    }
}

/// Local HSM configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KmsConfig {
    pub local_storage_path: String,
    /// Hex-encoded 32 byte key or a passphrase
    pub master_key: Option<String>,
}

/// Rotation behaviour shared by the lifecycle service
#[derive(Debug, Clone, Deserialize)]
pub struct RotationConfig {
    pub rollback_window_days: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    /// `json` or `console`
    pub format: String,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub kms: KmsConfig,
    pub rotation: RotationConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self::builder()?
            .add_source(
                Environment::with_prefix("KEYGUARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Defaults only, without reading the environment
    pub fn defaults() -> Result<Self, ConfigError> {
        let app_config: AppConfig = Self::builder()?.build()?.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("scheduler.check_interval_secs", 3600_i64)?
            .set_default("scheduler.error_backoff_secs", 300_i64)?
            .set_default("scheduler.error_backoff_max_secs", 3600_i64)?
            .set_default("scheduler.error_backoff_multiplier", 2.0_f64)?
            .set_default("scheduler.rotation_timeout_secs", 30_i64)?
            .set_default("kms.local_storage_path", "./kms")?
            .set_default("rotation.rollback_window_days", 30_i64)?
            .set_default("log.level", "info")?
            .set_default("log.format", "console")?)
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.check_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.error_backoff_secs == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.error_backoff_secs must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.error_backoff_max_secs < self.scheduler.error_backoff_secs {
            return Err(ConfigError::Invalid(
                "scheduler.error_backoff_max_secs must not be below error_backoff_secs".to_string(),
            ));
        }
        if self.scheduler.error_backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "scheduler.error_backoff_multiplier must be at least 1.0".to_string(),
            ));
        }
        if self.scheduler.rotation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.rotation_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.rotation.rollback_window_days > MAX_ROLLBACK_WINDOW_DAYS {
            return Err(ConfigError::Invalid(format!(
                "rotation.rollback_window_days must not exceed {}",
                MAX_ROLLBACK_WINDOW_DAYS
            )));
        }
        if !matches!(self.log.format.as_str(), "json" | "console") {
            return Err(ConfigError::Invalid(format!(
                "log.format must be json or console, got {}",
                self.log.format
            )));
        }
        Ok(())
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        if self.log.level.is_empty() {
            "info"
        } else {
            &self.log.level
        }
    }
}
