use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, Utc};
use clubledger_auth::{Principal, Role};
use clubledger_core::{Amount, MemberId};
use clubledger_infra::LedgerService;
use clubledger_infra::activity_log::ActivityQuery;
use clubledger_ledger::{Account, PaymentCategory};

fn treasurer() -> Principal {
    Principal::new("Tess", "tess@club.org", vec![Role::TREASURER])
}

fn admin() -> Principal {
    Principal::new("Admin", "admin@club.org", vec![Role::ADMIN])
}

/// Service with one account that already has `history` fines recorded.
fn service_with_history(history: usize) -> (LedgerService, MemberId) {
    let svc = LedgerService::in_memory(5);
    let member = MemberId::new();
    svc.open_account(member, &admin()).unwrap();
    for _ in 0..history {
        svc.record_fine(member, Amount::from_minor(10), "late", &treasurer())
            .unwrap();
    }
    (svc, member)
}

fn bench_command_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_latency");
    group.throughput(Throughput::Elements(1));

    for history in [0usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("record_fine", history), &history, |b, &history| {
            let (svc, member) = service_with_history(history);
            let actor = treasurer();
            b.iter(|| {
                svc.record_fine(black_box(member), Amount::from_minor(1), "bench", &actor)
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_rehydration(c: &mut Criterion) {
    let mut group = c.benchmark_group("rehydration");

    for history in [10usize, 500] {
        let (svc, member) = service_with_history(history);
        let account_id = svc.get_account_by_member(member, &admin()).unwrap().account_id;

        group.throughput(Throughput::Elements(history as u64 + 1));
        group.bench_with_input(BenchmarkId::new("load", history), &history, |b, _| {
            b.iter(|| {
                let account: Account = svc
                    .dispatcher()
                    .load(account_id.aggregate_id(), |id| Account::empty(id.into()))
                    .unwrap();
                black_box(account)
            });
        });
    }

    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("overdue_sweep");
    group.sample_size(20);

    group.bench_function("sweep_200_accounts", |b| {
        b.iter_batched(
            || {
                let now = Utc::now();
                let svc = LedgerService::in_memory(5);
                for _ in 0..200 {
                    let member = MemberId::new();
                    svc.open_account(member, &admin()).unwrap();
                    svc.record_borrow(member, Amount::from_minor(100), now + Duration::days(1), None, &treasurer())
                        .unwrap();
                }
                svc.with_clock(std::sync::Arc::new(move || now + Duration::days(2)))
            },
            |svc| black_box(svc.sweep_overdue(&Principal::system()).unwrap()),
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_payment_and_activity_listing(c: &mut Criterion) {
    let (svc, member) = service_with_history(500);
    let actor = treasurer();

    c.bench_function("record_payment", |b| {
        b.iter(|| {
            svc.record_payment(member, Amount::from_minor(1), PaymentCategory::FinePayment, None, &actor)
                .unwrap()
        })
    });

    c.bench_function("list_activities_limit_50", |b| {
        let query = ActivityQuery::for_member(member).limit(50);
        b.iter(|| black_box(svc.list_activities(&query, &admin()).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_command_latency,
    bench_rehydration,
    bench_sweep,
    bench_payment_and_activity_listing
);
criterion_main!(benches);
