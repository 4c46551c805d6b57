//! Tracing and logging setup shared by every ledger binary and test harness.
//!
//! The library crates only emit `tracing` events. The binary that hosts the
//! ledger installs the subscriber once at startup with
//! `init_with(&LedgerConfig::load(path)?.log)`.

use serde::{Deserialize, Serialize};

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `ledger_infra=debug,warn`.
    pub filter: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: true,
        }
    }
}

/// Initialize process-wide tracing with the default settings.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&LogConfig::default());
}

/// Initialize process-wide tracing from `config`. Returns `false` if a global
/// subscriber was already installed.
pub fn init_with(config: &LogConfig) -> bool {
    tracing::init(config)
}

/// Subscriber construction (filters, output format).
pub mod tracing;
