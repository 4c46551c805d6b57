use serde::{Deserialize, Serialize};

use ledger_core::{AccountId, Amount, CustomerId, Entity};

/// Materialized state of one account.
///
/// Never created directly by callers: an `Account` only comes into existence
/// when an `AccountOpened` event is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    customer_id: CustomerId,
    balance: Amount,
    /// Sequence number of the last event that touched this account.
    version: u64,
}

impl Account {
    pub(crate) fn opened(id: AccountId, customer_id: CustomerId, version: u64) -> Self {
        Self {
            id,
            customer_id,
            balance: Amount::ZERO,
            version,
        }
    }

    pub fn id_typed(&self) -> AccountId {
        self.id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub(crate) fn set_balance(&mut self, balance: Amount, version: u64) {
        self.balance = balance;
        self.version = version;
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
