//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

use crate::LogConfig;

/// Build the filter: `RUST_LOG` wins, then the configured directive, then `info`.
pub fn filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Safe to call multiple times (later calls are no-ops).
pub fn init(config: &LogConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(config))
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
