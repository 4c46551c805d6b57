use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use ledger_core::{AccountId, Amount, CustomerId, LedgerError, ValueObject};
use ledger_events::{Event, EventDecoder};

/// Stored type name of [`AccountOpened`].
pub const ACCOUNT_OPENED: &str = "account.opened";
/// Stored type name of [`Transaction`].
pub const TRANSACTION: &str = "account.transaction";
/// Every type name the ledger writes, in registration order.
pub const EVENT_TYPES: [&str; 2] = [ACCOUNT_OPENED, TRANSACTION];

/// Pseudo-account standing for external cash (deposits come from it,
/// withdrawals go to it). It never has a balance.
pub const ATM: &str = "ATM";

/// One side of a transaction.
///
/// Persisted as a plain string: `"ATM"` or the account UUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Party {
    Atm,
    Account(AccountId),
}

impl ValueObject for Party {}

impl Party {
    pub fn account(self) -> Option<AccountId> {
        match self {
            Party::Atm => None,
            Party::Account(id) => Some(id),
        }
    }
}

impl From<AccountId> for Party {
    fn from(value: AccountId) -> Self {
        Party::Account(value)
    }
}

impl TryFrom<String> for Party {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == ATM {
            return Ok(Party::Atm);
        }
        Ok(Party::Account(value.parse()?))
    }
}

impl From<Party> for String {
    fn from(value: Party) -> Self {
        value.to_string()
    }
}

impl core::fmt::Display for Party {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Party::Atm => f.write_str(ATM),
            Party::Account(id) => core::fmt::Display::fmt(id, f),
        }
    }
}

/// Event: AccountOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOpened {
    pub account_id: AccountId,
    pub customer_id: CustomerId,
}

/// Event: Transaction (money moved from one party to another).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Positive amount in smallest unit (e.g., cents).
    pub amount: Amount,
    pub from: Party,
    pub to: Party,
}

impl Transaction {
    pub fn deposit(to: AccountId, amount: Amount) -> Self {
        Self {
            amount,
            from: Party::Atm,
            to: Party::Account(to),
        }
    }

    pub fn withdrawal(from: AccountId, amount: Amount) -> Self {
        Self {
            amount,
            from: Party::Account(from),
            to: Party::Atm,
        }
    }

    pub fn transfer(from: AccountId, to: AccountId, amount: Amount) -> Self {
        Self {
            amount,
            from: Party::Account(from),
            to: Party::Account(to),
        }
    }

    /// `true` if the account is the source or the destination.
    pub fn involves(&self, account_id: AccountId) -> bool {
        self.from == Party::Account(account_id) || self.to == Party::Account(account_id)
    }

    /// Signed effect of this transaction on the account's balance.
    pub fn net_effect_on(&self, account_id: AccountId) -> i128 {
        let mut net = 0i128;
        if self.to == Party::Account(account_id) {
            net += i128::from(self.amount.minor_units());
        }
        if self.from == Party::Account(account_id) {
            net -= i128::from(self.amount.minor_units());
        }
        net
    }
}

/// Every event the ledger records.
///
/// Serialized without a tag: the type name is stored next to the payload by
/// the log, and [`LedgerEvent::decoders`] are keyed by it when reading back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LedgerEvent {
    AccountOpened(AccountOpened),
    Transaction(Transaction),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::AccountOpened(_) => ACCOUNT_OPENED,
            LedgerEvent::Transaction(_) => TRANSACTION,
        }
    }
}

impl LedgerEvent {
    /// Decoders to register with an event log, one per stored type name.
    pub fn decoders() -> [(&'static str, EventDecoder<LedgerEvent>); 2] {
        [
            (ACCOUNT_OPENED, decode_account_opened as EventDecoder<LedgerEvent>),
            (TRANSACTION, decode_transaction as EventDecoder<LedgerEvent>),
        ]
    }

    pub fn as_transaction(&self) -> Option<&Transaction> {
        match self {
            LedgerEvent::Transaction(tx) => Some(tx),
            LedgerEvent::AccountOpened(_) => None,
        }
    }

    pub fn into_transaction(self) -> Option<Transaction> {
        match self {
            LedgerEvent::Transaction(tx) => Some(tx),
            LedgerEvent::AccountOpened(_) => None,
        }
    }
}

impl From<AccountOpened> for LedgerEvent {
    fn from(value: AccountOpened) -> Self {
        LedgerEvent::AccountOpened(value)
    }
}

impl From<Transaction> for LedgerEvent {
    fn from(value: Transaction) -> Self {
        LedgerEvent::Transaction(value)
    }
}

fn decode_account_opened(payload: JsonValue) -> Result<LedgerEvent, serde_json::Error> {
    serde_json::from_value(payload).map(LedgerEvent::AccountOpened)
}

fn decode_transaction(payload: JsonValue) -> Result<LedgerEvent, serde_json::Error> {
    serde_json::from_value(payload).map(LedgerEvent::Transaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn party_uses_atm_sentinel() {
        let id = AccountId::new();
        assert_eq!(serde_json::to_value(Party::Atm).unwrap(), json!("ATM"));
        assert_eq!(serde_json::to_value(Party::Account(id)).unwrap(), json!(id.to_string()));
        assert_eq!(serde_json::from_value::<Party>(json!("ATM")).unwrap(), Party::Atm);
        assert!(serde_json::from_value::<Party>(json!("atm-42")).is_err());
    }

    #[test]
    fn payload_has_no_tag_and_decodes_by_type_name() {
        let to = AccountId::new();
        let event = LedgerEvent::from(Transaction::deposit(to, Amount::new(50)));

        let payload = serde_json::to_value(&event).unwrap();
        assert_eq!(payload, json!({"amount": 50, "from": "ATM", "to": to.to_string()}));

        let (_, decode) = LedgerEvent::decoders()
            .into_iter()
            .find(|(name, _)| *name == event.event_type())
            .unwrap();
        assert_eq!(decode(payload).unwrap(), event);
    }

    #[test]
    fn decoders_reject_the_other_payload_shape() {
        let opened = json!({ "account_id": AccountId::new().to_string(), "customer_id": "florimond" });
        let [(_, decode_opened), (_, decode_tx)] = LedgerEvent::decoders();

        assert!(matches!(decode_opened(opened.clone()), Ok(LedgerEvent::AccountOpened(_))));
        assert!(decode_tx(opened).is_err());
    }

    #[test]
    fn decoders_cover_every_event_type() {
        let names: Vec<_> = LedgerEvent::decoders().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, EVENT_TYPES.to_vec());
    }

    #[test]
    fn net_effect_counts_both_legs() {
        let a = AccountId::new();
        let b = AccountId::new();
        let tx = Transaction::transfer(a, b, Amount::new(25));
        assert_eq!(tx.net_effect_on(a), -25);
        assert_eq!(tx.net_effect_on(b), 25);
        assert!(!tx.involves(AccountId::new()));
    }
}
