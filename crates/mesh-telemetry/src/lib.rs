//! # Mesh Telemetry
//!
//! Logging and metrics for meshnode.
//!
//! - **Logs**: `tracing` events rendered by `tracing-subscriber`, either
//!   human-readable or JSON for log shippers.
//! - **Metrics**: Prometheus counters for connection traffic, negotiation
//!   failures and node lifecycle.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesh_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MESHNODE_SERVICE_NAME` | `meshnode` | Service name in logs |
//! | `MESHNODE_LOG_LEVEL` | `info` | Log level filter |
//! | `MESHNODE_JSON_LOGS` | `false` | JSON log lines |
//! | `MESHNODE_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{
    encode_metrics, register_metrics, BYTES_READ, BYTES_WRITTEN, CONNECTIONS_CLOSED,
    CONNECTIONS_OPENED, LIFECYCLE_TRANSITIONS, MODULE_ERRORS, NEGOTIATION_FAILURES,
    SCOPE_PROTOCOL, SCOPE_TRANSPORT,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
