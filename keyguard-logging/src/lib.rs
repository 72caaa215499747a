//! Structured logging setup for Keyguard services

use std::str::FromStr;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, for log shipping
    Json,
    /// Human-readable lines, for development
    Console,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "console" => Ok(LogFormat::Console),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Initialize logging for a Keyguard service.
///
/// `RUST_LOG` takes precedence over `default_level`. Fails if a global
/// subscriber is already installed.
pub fn init_logging(
    service_name: &str,
    default_level: &str,
    format: LogFormat,
) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .try_init()?,
        LogFormat::Console => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .try_init()?,
    }

    tracing::info!(
        service = service_name,
        format = ?format,
        "Logging initialized"
    );
    Ok(())
}
