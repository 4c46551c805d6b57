//! Account manager: the ledger's projector and command processor.
//!
//! ## Command Execution Flow
//!
//! ```text
//! LedgerCommand
//!   ↓
//! 1. Lock the projection (one writer at a time)
//!   ↓
//! 2. Decide events against the in-memory state (pure, no mutation)
//!   ↓
//! 3. Append each event to the log (sequence number assigned)
//!   ↓
//! 4. Apply the recorded event to the projection
//! ```
//!
//! A rejected command appends nothing. A failed append leaves the projection
//! untouched, so it always mirrors the durable log.
//!
//! ## Startup
//!
//! [`AccountManager::new`] registers the ledger's event types with the log and
//! replays the whole history before the manager can accept commands. Any
//! failure during replay (storage, unknown type, inconsistent history) is
//! returned and no manager is built.

use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use ledger_accounts::{
    Account, EVENT_TYPES, LedgerCommand, LedgerEvent, LedgerState, TRANSACTION, Transaction,
};
use ledger_core::{AccountId, Aggregate, Amount, CustomerId, LedgerError};
use ledger_events::{ProjectionError, ProjectionRunner, RecordedEvent};

use crate::event_log::{EventLog, EventLogError};
use crate::event_store::EventStoreError;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("insufficient funds on {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Amount,
        requested: Amount,
    },

    #[error("invalid amount: {0} (must be positive)")]
    InvalidAmount(Amount),

    #[error("balance overflow on {account}: balance {balance}, credit {requested}")]
    BalanceOverflow {
        account: AccountId,
        balance: Amount,
        requested: Amount,
    },

    #[error("cannot transfer from {0} to itself")]
    SameAccount(AccountId),

    #[error("validation failed: {0}")]
    Validation(String),

    /// Reading or writing the event log failed; the command was not applied.
    #[error("storage error: {0}")]
    Storage(EventStoreError),

    /// The log holds a type name nobody registered.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// The log contradicts itself or the projection; the view cannot be trusted.
    #[error("ledger integrity violated: {0}")]
    Integrity(String),

    #[error("account manager lock poisoned")]
    LockPoisoned,
}

impl ManagerError {
    /// `true` for expected, caller-recoverable rejections (nothing was recorded).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ManagerError::AccountNotFound(_)
                | ManagerError::InsufficientFunds { .. }
                | ManagerError::InvalidAmount(_)
                | ManagerError::BalanceOverflow { .. }
                | ManagerError::SameAccount(_)
                | ManagerError::Validation(_)
        )
    }
}

impl From<LedgerError> for ManagerError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::AccountNotFound(id) => ManagerError::AccountNotFound(id),
            LedgerError::InsufficientFunds {
                account,
                balance,
                requested,
            } => ManagerError::InsufficientFunds {
                account,
                balance,
                requested,
            },
            LedgerError::InvalidAmount(amount) => ManagerError::InvalidAmount(amount),
            LedgerError::BalanceOverflow {
                account,
                balance,
                requested,
            } => ManagerError::BalanceOverflow {
                account,
                balance,
                requested,
            },
            LedgerError::SameAccount(id) => ManagerError::SameAccount(id),
            LedgerError::Validation(msg) => ManagerError::Validation(msg),
            LedgerError::Integrity(msg) => ManagerError::Integrity(msg),
        }
    }
}

impl From<EventLogError> for ManagerError {
    fn from(value: EventLogError) -> Self {
        match value {
            EventLogError::Storage(err) => ManagerError::Storage(err),
            EventLogError::UnknownEventType(name) => ManagerError::UnknownEventType(name),
            err @ EventLogError::Decode { .. } => ManagerError::Integrity(err.to_string()),
        }
    }
}

impl From<ProjectionError<LedgerError>> for ManagerError {
    fn from(value: ProjectionError<LedgerError>) -> Self {
        match value {
            ProjectionError::Rejected { source, .. } => source.into(),
            err @ ProjectionError::NonMonotonicSequence { .. } => {
                ManagerError::Integrity(err.to_string())
            }
        }
    }
}

/// Successful result of [`AccountManager::process`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    AccountOpened {
        account_id: AccountId,
        sequence_number: u64,
    },
    Recorded {
        sequence_number: u64,
    },
}

impl CommandOutcome {
    /// The id of a newly opened account, if the command opened one.
    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            CommandOutcome::AccountOpened { account_id, .. } => Some(*account_id),
            CommandOutcome::Recorded { .. } => None,
        }
    }

    pub fn sequence_number(&self) -> u64 {
        match self {
            CommandOutcome::AccountOpened {
                sequence_number, ..
            }
            | CommandOutcome::Recorded { sequence_number } => *sequence_number,
        }
    }
}

/// Owns the ledger projection and serializes every command against it.
///
/// Constructed explicitly over an injected [`EventLog`]; share it behind an
/// `Arc` to serve several callers.
pub struct AccountManager<L> {
    log: L,
    projection: Mutex<ProjectionRunner<LedgerState>>,
}

impl<L> core::fmt::Debug for AccountManager<L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountManager").finish_non_exhaustive()
    }
}

impl<L> AccountManager<L>
where
    L: EventLog<LedgerEvent>,
{
    /// Register the ledger's event types and rebuild state from the full log.
    #[instrument(skip(log), err)]
    pub fn new(log: L) -> Result<Self, ManagerError> {
        for (name, decoder) in LedgerEvent::decoders() {
            log.register(name, decoder);
        }

        let history = log.find_changes(0, &EVENT_TYPES)?;
        let runner = ProjectionRunner::rebuild_from_scratch(LedgerState::new, &history)?;

        info!(
            events = runner.cursor().applied_events(),
            accounts = runner.projection().len(),
            last_sequence = runner.cursor().last_sequence_number(),
            "ledger replay complete"
        );

        Ok(Self {
            log,
            projection: Mutex::new(runner),
        })
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Validate a command against current state, record its event and apply it.
    #[instrument(skip(self, command), fields(command = command.kind()))]
    pub fn process(&self, command: LedgerCommand) -> Result<CommandOutcome, ManagerError> {
        let mut runner = self.lock()?;

        let events = match runner.projection().handle(&command) {
            Ok(events) => events,
            Err(err) if err.is_rejection() => {
                warn!(error = %err, "command rejected");
                return Err(err.into());
            }
            Err(err) => {
                error!(error = %err, "projected state is inconsistent");
                return Err(err.into());
            }
        };

        let mut outcome = None;
        for event in events {
            let recorded = self.log.append(event).map_err(|err| {
                error!(error = %err, "failed to append event");
                ManagerError::from(err)
            })?;
            runner.apply(&recorded).map_err(|err| {
                error!(
                    error = %err,
                    sequence_number = recorded.sequence_number(),
                    "recorded event could not be applied; projection is behind the log"
                );
                ManagerError::from(err)
            })?;

            let sequence_number = recorded.sequence_number();
            outcome = Some(match recorded.payload() {
                LedgerEvent::AccountOpened(opened) => {
                    info!(
                        account_id = %opened.account_id,
                        customer_id = %opened.customer_id,
                        sequence_number,
                        "account opened"
                    );
                    CommandOutcome::AccountOpened {
                        account_id: opened.account_id,
                        sequence_number,
                    }
                }
                LedgerEvent::Transaction(_) => CommandOutcome::Recorded { sequence_number },
            });
        }

        outcome.ok_or_else(|| ManagerError::Integrity("command produced no event".to_string()))
    }

    pub fn view_balance(&self, account_id: AccountId) -> Result<Amount, ManagerError> {
        Ok(self.lock()?.projection().balance(account_id)?)
    }

    pub fn view_account(&self, account_id: AccountId) -> Result<Account, ManagerError> {
        self.lock()?
            .projection()
            .get(account_id)
            .cloned()
            .ok_or(ManagerError::AccountNotFound(account_id))
    }

    pub fn accounts_of(&self, customer_id: &CustomerId) -> Result<Vec<Account>, ManagerError> {
        Ok(self
            .lock()?
            .projection()
            .accounts_of(customer_id)
            .cloned()
            .collect())
    }

    /// Every transaction where the account is source or destination, in log order.
    ///
    /// Scans the full transaction history on each call.
    // TODO: keep a per-account index of sequence numbers in the projection once
    // histories outgrow a linear scan.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub fn view_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<RecordedEvent<Transaction>>, ManagerError> {
        // Held for the scan so no half-applied command is observed.
        let runner = self.lock()?;
        if !runner.projection().contains(account_id) {
            return Err(ManagerError::AccountNotFound(account_id));
        }

        let history = self.log.find_changes(0, &[TRANSACTION])?;
        Ok(history
            .into_iter()
            .filter_map(|recorded| {
                let tx = recorded
                    .payload()
                    .as_transaction()
                    .filter(|tx| tx.involves(account_id))?
                    .clone();
                Some(recorded.map(|_| tx))
            })
            .collect())
    }

    /// Sequence number of the last event applied to the projection.
    pub fn last_sequence(&self) -> Result<u64, ManagerError> {
        Ok(self.lock()?.cursor().last_sequence_number())
    }

    /// Snapshot of the full projected state.
    pub fn snapshot(&self) -> Result<LedgerState, ManagerError> {
        Ok(self.lock()?.projection().clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProjectionRunner<LedgerState>>, ManagerError> {
        self.projection.lock().map_err(|_| ManagerError::LockPoisoned)
    }
}
