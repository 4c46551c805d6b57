use std::collections::BTreeMap;

use ledger_core::{AccountId, Aggregate, Amount, CustomerId, LedgerError, LedgerResult};
use ledger_events::{Projection, RecordedEvent};

use crate::account::Account;
use crate::command::{Deposit, LedgerCommand, OpenAccount, Transfer, Withdraw};
use crate::event::{AccountOpened, LedgerEvent, Transaction};

/// The ledger's materialized view: every opened account and its balance.
///
/// A pure fold over the event stream (`state_n = apply(state_{n-1}, event_n)`,
/// starting empty). Two states built from the same events compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    accounts: BTreeMap<AccountId, Account>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, account_id: AccountId) -> Option<&Account> {
        self.accounts.get(&account_id)
    }

    pub fn contains(&self, account_id: AccountId) -> bool {
        self.accounts.contains_key(&account_id)
    }

    pub fn balance(&self, account_id: AccountId) -> LedgerResult<Amount> {
        self.account(account_id).map(Account::balance)
    }

    /// All accounts ordered by id.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn accounts_of<'a>(&'a self, customer_id: &'a CustomerId) -> impl Iterator<Item = &'a Account> {
        self.accounts
            .values()
            .filter(move |account| account.customer_id() == customer_id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sum of all balances, i.e. net cash that entered through the ATM.
    pub fn total_balance(&self) -> i128 {
        self.accounts
            .values()
            .map(|account| i128::from(account.balance().minor_units()))
            .sum()
    }

    fn account(&self, account_id: AccountId) -> LedgerResult<&Account> {
        self.accounts
            .get(&account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    fn apply_opened(&mut self, seq: u64, e: &AccountOpened) -> LedgerResult<()> {
        if self.accounts.contains_key(&e.account_id) {
            return Err(LedgerError::integrity(format!(
                "account {} opened twice (event {seq})",
                e.account_id
            )));
        }
        self.accounts.insert(
            e.account_id,
            Account::opened(e.account_id, e.customer_id.clone(), seq),
        );
        Ok(())
    }

    fn apply_transaction(&mut self, seq: u64, tx: &Transaction) -> LedgerResult<()> {
        if !tx.amount.is_positive() {
            return Err(LedgerError::integrity(format!(
                "non-positive amount {} in transaction {seq}",
                tx.amount
            )));
        }

        // Stage both legs first so a failing leg leaves the state untouched.
        let mut staged: Vec<(AccountId, Amount)> = Vec::with_capacity(2);
        if let Some(from) = tx.from.account() {
            let balance = self.recorded_account(seq, from)?.balance();
            staged.push((from, balance.checked_sub(tx.amount)?));
        }
        if let Some(to) = tx.to.account() {
            let balance = match staged.iter().find(|(id, _)| *id == to) {
                Some((_, staged_balance)) => *staged_balance,
                None => self.recorded_account(seq, to)?.balance(),
            };
            staged.push((to, balance.checked_add(tx.amount)?));
        }

        for (id, balance) in staged {
            if let Some(account) = self.accounts.get_mut(&id) {
                account.set_balance(balance, seq);
            }
        }
        Ok(())
    }

    /// Lookup during apply: a missing account means the log is inconsistent.
    fn recorded_account(&self, seq: u64, account_id: AccountId) -> LedgerResult<&Account> {
        self.accounts.get(&account_id).ok_or_else(|| {
            LedgerError::integrity(format!(
                "transaction {seq} references unknown account {account_id}"
            ))
        })
    }

    fn ensure_positive(amount: Amount) -> LedgerResult<()> {
        if amount.is_positive() {
            Ok(())
        } else {
            Err(LedgerError::InvalidAmount(amount))
        }
    }

    fn ensure_funds(&self, account_id: AccountId, amount: Amount) -> LedgerResult<()> {
        let balance = self.balance(account_id)?;
        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: account_id,
                balance,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Reject a credit the destination balance cannot absorb, so an accepted
    /// command can always be applied.
    fn ensure_credit(&self, account_id: AccountId, amount: Amount) -> LedgerResult<()> {
        let balance = self.balance(account_id)?;
        if balance.checked_add(amount).is_err() {
            return Err(LedgerError::BalanceOverflow {
                account: account_id,
                balance,
                requested: amount,
            });
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenAccount) -> LedgerResult<Vec<LedgerEvent>> {
        if self.contains(cmd.account_id) {
            return Err(LedgerError::validation(format!(
                "account {} already exists",
                cmd.account_id
            )));
        }
        Ok(vec![LedgerEvent::AccountOpened(AccountOpened {
            account_id: cmd.account_id,
            customer_id: cmd.customer_id.clone(),
        })])
    }

    fn handle_deposit(&self, cmd: &Deposit) -> LedgerResult<Vec<LedgerEvent>> {
        Self::ensure_positive(cmd.amount)?;
        self.ensure_credit(cmd.to, cmd.amount)?;
        Ok(vec![Transaction::deposit(cmd.to, cmd.amount).into()])
    }

    fn handle_withdraw(&self, cmd: &Withdraw) -> LedgerResult<Vec<LedgerEvent>> {
        Self::ensure_positive(cmd.amount)?;
        self.ensure_funds(cmd.from, cmd.amount)?;
        Ok(vec![Transaction::withdrawal(cmd.from, cmd.amount).into()])
    }

    fn handle_transfer(&self, cmd: &Transfer) -> LedgerResult<Vec<LedgerEvent>> {
        Self::ensure_positive(cmd.amount)?;
        self.account(cmd.to)?;
        self.account(cmd.from)?;
        if cmd.from == cmd.to {
            return Err(LedgerError::SameAccount(cmd.from));
        }
        self.ensure_funds(cmd.from, cmd.amount)?;
        self.ensure_credit(cmd.to, cmd.amount)?;
        Ok(vec![Transaction::transfer(cmd.from, cmd.to, cmd.amount).into()])
    }
}

impl Aggregate for LedgerState {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = LedgerError;

    fn apply(&mut self, sequence_number: u64, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            LedgerEvent::AccountOpened(e) => self.apply_opened(sequence_number, e),
            LedgerEvent::Transaction(tx) => self.apply_transaction(sequence_number, tx),
        }
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::OpenAccount(cmd) => self.handle_open(cmd),
            LedgerCommand::Deposit(cmd) => self.handle_deposit(cmd),
            LedgerCommand::Withdraw(cmd) => self.handle_withdraw(cmd),
            LedgerCommand::Transfer(cmd) => self.handle_transfer(cmd),
        }
    }
}

impl Projection for LedgerState {
    type Ev = LedgerEvent;
    type Error = LedgerError;

    fn apply(&mut self, event: &RecordedEvent<LedgerEvent>) -> Result<(), LedgerError> {
        Aggregate::apply(self, event.sequence_number(), event.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::Entity;
    use proptest::prelude::*;

    fn customer(name: &str) -> CustomerId {
        CustomerId::new(name).unwrap()
    }

    /// Decide + apply, numbering events from `next_seq`.
    fn execute(state: &mut LedgerState, next_seq: &mut u64, cmd: LedgerCommand) -> Result<(), LedgerError> {
        let events = state.handle(&cmd)?;
        for e in &events {
            *next_seq += 1;
            Aggregate::apply(state, *next_seq, e)?;
        }
        Ok(())
    }

    fn open(state: &mut LedgerState, seq: &mut u64, name: &str) -> AccountId {
        let cmd = OpenAccount::new(customer(name));
        let id = cmd.account_id;
        execute(state, seq, LedgerCommand::OpenAccount(cmd)).unwrap();
        id
    }

    #[test]
    fn open_deposit_withdraw_transfer_scenario() {
        let mut state = LedgerState::new();
        let mut seq = 0;

        let a = open(&mut state, &mut seq, "florimond");
        assert_eq!(state.balance(a), Ok(Amount::ZERO));

        execute(&mut state, &mut seq, LedgerCommand::deposit(a, 50)).unwrap();
        assert_eq!(state.balance(a), Ok(Amount::new(50)));

        execute(&mut state, &mut seq, LedgerCommand::withdraw(a, 25)).unwrap();
        assert_eq!(state.balance(a), Ok(Amount::new(25)));

        let b = open(&mut state, &mut seq, "emilie");
        execute(&mut state, &mut seq, LedgerCommand::transfer(a, b, 25)).unwrap();

        assert_eq!(state.balance(a), Ok(Amount::ZERO));
        assert_eq!(state.balance(b), Ok(Amount::new(25)));
        assert_eq!(state.get(a).unwrap().version(), 5);
        assert_eq!(state.get(b).unwrap().version(), 5);
        assert_eq!(state.total_balance(), 25);
    }

    #[test]
    fn withdraw_more_than_balance_is_rejected() {
        let mut state = LedgerState::new();
        let mut seq = 0;
        let a = open(&mut state, &mut seq, "florimond");
        execute(&mut state, &mut seq, LedgerCommand::deposit(a, 25)).unwrap();

        let err = state.handle(&LedgerCommand::withdraw(a, 100)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                account: a,
                balance: Amount::new(25),
                requested: Amount::new(100),
            }
        );
        assert_eq!(state.balance(a), Ok(Amount::new(25)));
    }

    #[test]
    fn unknown_accounts_are_rejected() {
        let mut state = LedgerState::new();
        let mut seq = 0;
        let a = open(&mut state, &mut seq, "florimond");
        let ghost = AccountId::new();

        assert_eq!(
            state.handle(&LedgerCommand::deposit(ghost, 10)),
            Err(LedgerError::AccountNotFound(ghost))
        );
        assert_eq!(
            state.handle(&LedgerCommand::withdraw(ghost, 10)),
            Err(LedgerError::AccountNotFound(ghost))
        );
        assert_eq!(
            state.handle(&LedgerCommand::transfer(a, ghost, 10)),
            Err(LedgerError::AccountNotFound(ghost))
        );
        assert_eq!(
            state.handle(&LedgerCommand::transfer(ghost, a, 10)),
            Err(LedgerError::AccountNotFound(ghost))
        );
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let mut state = LedgerState::new();
        let mut seq = 0;
        let a = open(&mut state, &mut seq, "florimond");

        for amount in [0, -5] {
            assert_eq!(
                state.handle(&LedgerCommand::deposit(a, amount)),
                Err(LedgerError::InvalidAmount(Amount::new(amount)))
            );
        }
    }

    #[test]
    fn amount_is_checked_before_the_account() {
        let state = LedgerState::new();
        let ghost = AccountId::new();

        assert_eq!(
            state.handle(&LedgerCommand::deposit(ghost, 0)),
            Err(LedgerError::InvalidAmount(Amount::ZERO))
        );
        assert_eq!(
            state.handle(&LedgerCommand::deposit(ghost, 1)),
            Err(LedgerError::AccountNotFound(ghost))
        );
    }

    #[test]
    fn credit_past_the_balance_limit_is_rejected() {
        let mut state = LedgerState::new();
        let mut seq = 0;
        let a = open(&mut state, &mut seq, "florimond");
        let b = open(&mut state, &mut seq, "emilie");
        execute(&mut state, &mut seq, LedgerCommand::deposit(a, i64::MAX)).unwrap();
        execute(&mut state, &mut seq, LedgerCommand::deposit(b, 1)).unwrap();

        let overflow = LedgerError::BalanceOverflow {
            account: a,
            balance: Amount::new(i64::MAX),
            requested: Amount::new(1),
        };
        assert_eq!(state.handle(&LedgerCommand::deposit(a, 1)), Err(overflow.clone()));
        assert_eq!(state.handle(&LedgerCommand::transfer(b, a, 1)), Err(overflow));
        assert_eq!(state.balance(a), Ok(Amount::new(i64::MAX)));
        assert_eq!(state.balance(b), Ok(Amount::new(1)));
    }

    #[test]
    fn transfer_to_self_is_rejected() {
        let mut state = LedgerState::new();
        let mut seq = 0;
        let a = open(&mut state, &mut seq, "florimond");
        execute(&mut state, &mut seq, LedgerCommand::deposit(a, 10)).unwrap();

        assert_eq!(
            state.handle(&LedgerCommand::transfer(a, a, 5)),
            Err(LedgerError::SameAccount(a))
        );
    }

    #[test]
    fn replaying_inconsistent_events_is_an_integrity_error() {
        let mut state = LedgerState::new();
        let a = AccountId::new();
        let opened = LedgerEvent::AccountOpened(AccountOpened {
            account_id: a,
            customer_id: customer("florimond"),
        });

        Aggregate::apply(&mut state, 1, &opened).unwrap();
        assert!(matches!(
            Aggregate::apply(&mut state, 2, &opened),
            Err(LedgerError::Integrity(_))
        ));

        // Unknown destination: the debit leg must not be applied either.
        let dangling: LedgerEvent = Transaction::transfer(a, AccountId::new(), Amount::new(5)).into();
        assert!(matches!(
            Aggregate::apply(&mut state, 3, &dangling),
            Err(LedgerError::Integrity(_))
        ));
        assert_eq!(state.balance(a), Ok(Amount::ZERO));
        assert_eq!(state.get(a).unwrap().version(), 1);
    }

    #[test]
    fn accounts_are_listed_per_customer() {
        let mut state = LedgerState::new();
        let mut seq = 0;
        open(&mut state, &mut seq, "florimond");
        open(&mut state, &mut seq, "florimond");
        open(&mut state, &mut seq, "emilie");

        assert_eq!(state.accounts_of(&customer("florimond")).count(), 2);
        assert_eq!(state.accounts_of(&customer("emilie")).count(), 1);
        assert_eq!(state.len(), 3);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Deposit(usize, i64),
        Withdraw(usize, i64),
        Transfer(usize, usize, i64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..3, 1i64..1_000).prop_map(|(a, n)| Op::Deposit(a, n)),
            (0usize..3, 1i64..1_000).prop_map(|(a, n)| Op::Withdraw(a, n)),
            (0usize..3, 0usize..3, 1i64..1_000).prop_map(|(a, b, n)| Op::Transfer(a, b, n)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever commands are accepted, every balance equals
        /// credits minus debits over the recorded transactions, no balance goes
        /// negative, and replaying the recorded events rebuilds the same state.
        #[test]
        fn balances_match_history_and_replay(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let mut state = LedgerState::new();
            let mut history: Vec<(u64, LedgerEvent)> = Vec::new();
            let mut seq = 0u64;

            let mut ids = Vec::new();
            for name in ["a", "b", "c"] {
                let cmd = LedgerCommand::open_account(customer(name));
                for e in state.handle(&cmd).unwrap() {
                    seq += 1;
                    Aggregate::apply(&mut state, seq, &e).unwrap();
                    if let LedgerEvent::AccountOpened(opened) = &e {
                        ids.push(opened.account_id);
                    }
                    history.push((seq, e));
                }
            }

            for op in ops {
                let cmd = match op {
                    Op::Deposit(a, n) => LedgerCommand::deposit(ids[a], n),
                    Op::Withdraw(a, n) => LedgerCommand::withdraw(ids[a], n),
                    Op::Transfer(a, b, n) => LedgerCommand::transfer(ids[a], ids[b], n),
                };
                if let Ok(events) = state.handle(&cmd) {
                    for e in events {
                        seq += 1;
                        Aggregate::apply(&mut state, seq, &e).unwrap();
                        history.push((seq, e));
                    }
                }
            }

            for id in &ids {
                let expected: i128 = history
                    .iter()
                    .filter_map(|(_, e)| e.as_transaction())
                    .map(|tx| tx.net_effect_on(*id))
                    .sum();
                let balance = state.balance(*id).unwrap();
                prop_assert_eq!(i128::from(balance.minor_units()), expected);
                prop_assert!(balance >= Amount::ZERO);
            }

            let mut replayed = LedgerState::new();
            for (s, e) in &history {
                Aggregate::apply(&mut replayed, *s, e).unwrap();
            }
            prop_assert_eq!(replayed, state);
        }
    }
}
