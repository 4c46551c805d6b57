//! Accounts module (double-entry bank ledger, event-sourced).
//!
//! Pure domain logic only: no IO, no persistence concerns. State is a fold over
//! [`LedgerEvent`]s; commands are decided against that state.

pub mod account;
pub mod command;
pub mod event;
pub mod state;

pub use account::Account;
pub use command::{Deposit, LedgerCommand, OpenAccount, Transfer, Withdraw};
pub use event::{
    ACCOUNT_OPENED, AccountOpened, ATM, EVENT_TYPES, LedgerEvent, Party, TRANSACTION, Transaction,
};
pub use state::LedgerState;
