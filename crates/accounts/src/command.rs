use serde::{Deserialize, Serialize};

use ledger_core::{AccountId, Amount, CustomerId};

/// Command: OpenAccount.
///
/// The new account's id travels with the command so that deciding it stays
/// pure; [`OpenAccount::new`] draws a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAccount {
    pub account_id: AccountId,
    pub customer_id: CustomerId,
}

impl OpenAccount {
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            account_id: AccountId::new(),
            customer_id,
        }
    }
}

/// Command: Deposit cash into an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub to: AccountId,
    pub amount: Amount,
}

/// Command: Withdraw cash from an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdraw {
    pub from: AccountId,
    pub amount: Amount,
}

/// Command: Transfer between two managed accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    OpenAccount(OpenAccount),
    Deposit(Deposit),
    Withdraw(Withdraw),
    Transfer(Transfer),
}

impl LedgerCommand {
    pub fn open_account(customer_id: CustomerId) -> Self {
        LedgerCommand::OpenAccount(OpenAccount::new(customer_id))
    }

    pub fn deposit(to: AccountId, amount: impl Into<Amount>) -> Self {
        LedgerCommand::Deposit(Deposit {
            to,
            amount: amount.into(),
        })
    }

    pub fn withdraw(from: AccountId, amount: impl Into<Amount>) -> Self {
        LedgerCommand::Withdraw(Withdraw {
            from,
            amount: amount.into(),
        })
    }

    pub fn transfer(from: AccountId, to: AccountId, amount: impl Into<Amount>) -> Self {
        LedgerCommand::Transfer(Transfer {
            from,
            to,
            amount: amount.into(),
        })
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerCommand::OpenAccount(_) => "open_account",
            LedgerCommand::Deposit(_) => "deposit",
            LedgerCommand::Withdraw(_) => "withdraw",
            LedgerCommand::Transfer(_) => "transfer",
        }
    }
}
