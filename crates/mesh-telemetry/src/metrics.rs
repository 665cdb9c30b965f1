//! Prometheus metrics for meshnode.
//!
//! All metrics follow the naming convention: `meshnode_<area>_<metric>_<unit>`.
//!
//! Connection metrics carry a `scope` label (`transport` or `protocol`) and
//! a `name` label holding the transport tag or the negotiated protocol id.
//! A connection is counted once per scope, so the transport view and the
//! protocol view never double-count each other.

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

/// `scope` label value for transport-level observations.
pub const SCOPE_TRANSPORT: &str = "transport";

/// `scope` label value for protocol-level observations.
pub const SCOPE_PROTOCOL: &str = "protocol";

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CONNECTION METRICS
    // =========================================================================

    /// Connections handed to the observer
    pub static ref CONNECTIONS_OPENED: CounterVec = CounterVec::new(
        Opts::new("meshnode_connections_opened_total", "Connections observed opening"),
        &["scope", "name"]
    ).expect("metric creation failed");

    /// Connections that reached end of stream or were dropped
    pub static ref CONNECTIONS_CLOSED: CounterVec = CounterVec::new(
        Opts::new("meshnode_connections_closed_total", "Connections observed closing"),
        &["scope", "name"]
    ).expect("metric creation failed");

    /// Bytes read from observed connections
    pub static ref BYTES_READ: CounterVec = CounterVec::new(
        Opts::new("meshnode_connection_bytes_read_total", "Bytes read from connections"),
        &["scope", "name"]
    ).expect("metric creation failed");

    /// Bytes written to observed connections
    pub static ref BYTES_WRITTEN: CounterVec = CounterVec::new(
        Opts::new("meshnode_connection_bytes_written_total", "Bytes written to connections"),
        &["scope", "name"]
    ).expect("metric creation failed");

    /// Failed protocol negotiations
    pub static ref NEGOTIATION_FAILURES: CounterVec = CounterVec::new(
        Opts::new("meshnode_negotiation_failures_total", "Protocol negotiations that failed"),
        &["transport", "reason"]  // reason: io/too_large/invalid/header/exhausted
    ).expect("metric creation failed");

    // =========================================================================
    // LIFECYCLE METRICS
    // =========================================================================

    /// Node state transitions
    pub static ref LIFECYCLE_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("meshnode_lifecycle_transitions_total", "Node state transitions"),
        &["state"]  // state: starting/started/stopping/stopped
    ).expect("metric creation failed");

    /// Module errors by module and kind
    pub static ref MODULE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("meshnode_module_errors_total", "Errors by module and kind"),
        &["module", "kind"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling it more than once is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Connections
        Box::new(CONNECTIONS_OPENED.clone()),
        Box::new(CONNECTIONS_CLOSED.clone()),
        Box::new(BYTES_READ.clone()),
        Box::new(BYTES_WRITTEN.clone()),
        Box::new(NEGOTIATION_FAILURES.clone()),
        // Lifecycle
        Box::new(LIFECYCLE_TRANSITIONS.clone()),
        Box::new(MODULE_ERRORS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
