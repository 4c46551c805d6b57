//! Configuration loading and representation.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults (in-memory store, `info` JSON logs)
//! 2. an optional JSON file
//! 3. `LEDGER_*` environment variables

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use ledger_observability::LogConfig;

use crate::event_store::{EventStore, FileEventStore, InMemoryEventStore};

pub const ENV_STORAGE_KIND: &str = "LEDGER_STORAGE_KIND";
pub const ENV_STORAGE_PATH: &str = "LEDGER_STORAGE_PATH";
pub const ENV_LOG_FILTER: &str = "LEDGER_LOG_FILTER";
pub const ENV_LOG_JSON: &str = "LEDGER_LOG_JSON";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Memory,
    File,
}

impl core::str::FromStr for StorageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "file" => Ok(StorageKind::File),
            other => bail!("unknown storage kind `{other}` (expected `memory` or `file`)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// Log file location; only read when `kind` is `file`.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            path: PathBuf::from("ledger-events.jsonl"),
        }
    }
}

impl LedgerConfig {
    /// Load from `path` (if it exists) and then apply the process environment.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut config = Self::from_file(path.as_ref())?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read the JSON file at `path`. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Apply `LEDGER_*` overrides resolved through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(kind) = lookup(ENV_STORAGE_KIND) {
            self.storage.kind = kind
                .parse()
                .with_context(|| format!("invalid {ENV_STORAGE_KIND}"))?;
        }
        if let Some(path) = lookup(ENV_STORAGE_PATH) {
            self.storage.path = PathBuf::from(path);
        }
        if let Some(filter) = lookup(ENV_LOG_FILTER) {
            self.log.filter = filter;
        }
        if let Some(json) = lookup(ENV_LOG_JSON) {
            self.log.json = parse_bool(&json).with_context(|| format!("invalid {ENV_LOG_JSON}"))?;
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got `{other}`"),
    }
}

/// Open the event store selected by `config`.
pub fn open_store(config: &StorageConfig) -> anyhow::Result<Box<dyn EventStore>> {
    match config.kind {
        StorageKind::Memory => {
            info!("using in-memory event store");
            Ok(Box::new(InMemoryEventStore::new()))
        }
        StorageKind::File => {
            let store = FileEventStore::open(&config.path).with_context(|| {
                format!("failed to open event log {}", config.path.display())
            })?;
            info!(path = %config.path.display(), "using file event store");
            Ok(Box::new(store))
        }
    }
}
