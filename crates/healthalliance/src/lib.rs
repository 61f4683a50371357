pub mod access;
pub mod config;
pub mod error;
pub mod institutions;
pub mod telemetry;
pub mod workflows;

/// Release identifier surfaced by the service metadata and health probes.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
