//! Logging setup for the preview service.
//!
//! Output goes to stdout through `tracing-subscriber`, filtered by `RUST_LOG`
//! (default `info`). `LOGGING__FORMAT=json` switches to one JSON object per
//! line for log shippers.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Result type for telemetry operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Telemetry-specific error type
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Unknown log format: {0}")]
    UnknownFormat(String),
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Supported log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> TelemetryResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Fails if the format is unknown or a subscriber is already installed.
pub fn init_telemetry(config: &LoggingConfig) -> TelemetryResult<LogFormat> {
    let format = LogFormat::parse(&config.format)?;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init(),
    };
    installed.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(format = ?format, "Tracing initialized");
    Ok(format)
}
