//! vaultadm-telemetry - logging setup
//!
//! Logs go to stderr so that stdout stays reserved for machine-readable
//! command output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Initialize human-readable tracing output
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(filter(log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize JSON tracing output (production)
pub fn init_tracing_json(log_level: &str) {
    tracing_subscriber::registry()
        .with(filter(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();
}
