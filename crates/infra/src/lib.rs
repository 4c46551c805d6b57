//! Infrastructure layer: event storage, the typed event log, configuration and
//! the account manager that ties them to the ledger domain.

pub mod account_manager;
pub mod config;
pub mod event_log;
pub mod event_store;
pub mod registry;


pub use account_manager::{AccountManager, CommandOutcome, ManagerError};
pub use config::{LedgerConfig, StorageConfig, StorageKind, open_store};
pub use event_log::{EventLog, EventLogError, TypedEventLog};
pub use event_store::{EventStore, EventStoreError, FileEventStore, InMemoryEventStore};
pub use registry::TypeRegistry;
