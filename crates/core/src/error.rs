//! Domain error model.

use thiserror::Error;

use crate::id::AccountId;
use crate::money::Amount;

/// Result type used across the domain layer.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants). Storage concerns belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The referenced account has never been opened.
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// A withdrawal or transfer exceeds the current balance of the source account.
    #[error("insufficient funds on {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Amount,
        requested: Amount,
    },

    /// Crediting the account would push its balance past the representable range.
    #[error("balance overflow on {account}: balance {balance}, credit {requested}")]
    BalanceOverflow {
        account: AccountId,
        balance: Amount,
        requested: Amount,
    },

    /// Monetary commands require a strictly positive amount.
    #[error("invalid amount: {0} (must be positive)")]
    InvalidAmount(Amount),

    /// Transfers must move money between two distinct accounts.
    #[error("cannot transfer from {0} to itself")]
    SameAccount(AccountId),

    /// A command field failed validation (e.g. empty customer id).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The event stream contradicts the projected state (duplicate account,
    /// unknown account in a transaction, overflow). Never caused by user input.
    #[error("ledger integrity violated: {0}")]
    Integrity(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    /// `true` for failures caused by the caller's request rather than by the log.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, LedgerError::Integrity(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_integrity_failures_are_not_rejections() {
        let id = AccountId::new();
        assert!(LedgerError::AccountNotFound(id).is_rejection());
        assert!(LedgerError::InvalidAmount(Amount::ZERO).is_rejection());
        assert!(
            LedgerError::BalanceOverflow {
                account: id,
                balance: Amount::new(i64::MAX),
                requested: Amount::new(1),
            }
            .is_rejection()
        );
        assert!(!LedgerError::integrity("account opened twice").is_rejection());
    }
}
