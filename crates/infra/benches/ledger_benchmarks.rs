use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use ledger_accounts::{EVENT_TYPES, LedgerCommand, LedgerEvent};
use ledger_core::{AccountId, CustomerId};
use ledger_infra::account_manager::AccountManager;
use ledger_infra::event_log::{EventLog, TypedEventLog};
use ledger_infra::event_store::{FileEventStore, InMemoryEventStore};
use std::sync::Arc;

type MemoryManager = AccountManager<TypedEventLog<Arc<InMemoryEventStore>, LedgerEvent>>;

fn setup() -> (MemoryManager, Arc<InMemoryEventStore>) {
    let store = Arc::new(InMemoryEventStore::new());
    let manager = AccountManager::new(TypedEventLog::new(store.clone())).unwrap();
    (manager, store)
}

fn open<L: EventLog<LedgerEvent>>(manager: &AccountManager<L>, name: &str) -> AccountId {
    manager
        .process(LedgerCommand::open_account(CustomerId::new(name).unwrap()))
        .unwrap()
        .account_id()
        .unwrap()
}

/// Fill a fresh store with `accounts` funded accounts and `transfers` transfers.
fn seeded(accounts: usize, transfers: usize) -> Arc<InMemoryEventStore> {
    let (manager, store) = setup();
    let ids: Vec<_> = (0..accounts).map(|i| open(&manager, &format!("c{i}"))).collect();
    for &id in &ids {
        manager.process(LedgerCommand::deposit(id, 1_000_000)).unwrap();
    }
    for i in 0..transfers {
        let from = ids[i % ids.len()];
        let to = ids[(i + 1) % ids.len()];
        manager.process(LedgerCommand::transfer(from, to, 1)).unwrap();
    }
    store
}

fn bench_command_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_latency");
    group.sample_size(1000);

    // OpenAccount on a growing ledger
    group.bench_function("open_account", |b| {
        let (manager, _) = setup();
        b.iter(|| {
            manager
                .process(LedgerCommand::open_account(black_box(CustomerId::new("bench").unwrap())))
                .unwrap();
        });
    });

    // Deposit then withdraw so the balance stays bounded
    group.bench_function("deposit_withdraw", |b| {
        let (manager, _) = setup();
        let a = open(&manager, "bench");
        b.iter(|| {
            manager.process(LedgerCommand::deposit(a, black_box(10))).unwrap();
            manager.process(LedgerCommand::withdraw(a, black_box(10))).unwrap();
        });
    });

    group.bench_function("transfer_round_trip", |b| {
        let (manager, _) = setup();
        let a = open(&manager, "a");
        let z = open(&manager, "z");
        manager.process(LedgerCommand::deposit(a, 100)).unwrap();
        b.iter(|| {
            manager.process(LedgerCommand::transfer(a, z, black_box(5))).unwrap();
            manager.process(LedgerCommand::transfer(z, a, black_box(5))).unwrap();
        });
    });

    // Rejected commands never touch the log
    group.bench_function("rejected_withdraw", |b| {
        let (manager, _) = setup();
        let a = open(&manager, "bench");
        b.iter(|| {
            let _ = manager.process(LedgerCommand::withdraw(a, black_box(1)));
        });
    });

    group.finish();
}

fn bench_durable_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("durable_append");
    group.sample_size(50);

    group.bench_function("file_deposit", |b| {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEventStore::open(dir.path().join("bench.jsonl")).unwrap();
        let manager = AccountManager::new(TypedEventLog::new(store)).unwrap();
        let a = open(&manager, "bench");
        b.iter(|| {
            manager.process(LedgerCommand::deposit(a, black_box(1))).unwrap();
        });
    });

    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");

    for transfers in [100usize, 1_000, 10_000].iter() {
        let store = seeded(16, *transfers);
        let events = store.len() as u64;
        group.throughput(Throughput::Elements(events));
        group.bench_with_input(
            BenchmarkId::new("rebuild_manager", transfers),
            &store,
            |b, store| {
                b.iter(|| {
                    let manager = AccountManager::new(TypedEventLog::new(store.clone())).unwrap();
                    black_box(manager.last_sequence().unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_view_transactions(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_transactions");

    for transfers in [100usize, 1_000, 10_000].iter() {
        let store = seeded(16, *transfers);
        let manager = AccountManager::new(TypedEventLog::new(store)).unwrap();
        let log = manager.log();
        let first = log
            .find_changes(0, &EVENT_TYPES)
            .unwrap()
            .into_iter()
            .find_map(|e| match e.into_payload() {
                LedgerEvent::AccountOpened(opened) => Some(opened.account_id),
                LedgerEvent::Transaction(_) => None,
            })
            .unwrap();

        group.bench_with_input(
            BenchmarkId::new("linear_scan", transfers),
            &first,
            |b, &account| {
                b.iter(|| black_box(manager.view_transactions(account).unwrap().len()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_command_latency,
    bench_durable_append,
    bench_replay,
    bench_view_transactions
);
criterion_main!(benches);
