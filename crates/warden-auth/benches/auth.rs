//! Benchmarks for warden eligibility evaluation.

use std::collections::HashMap;
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use time::macros::date;
use warden_auth::{Account, Registry, evaluate};

const TODAY: time::Date = date!(2026 - 08 - 04);

fn limited_account() -> Account {
    let mut account = Account::with_password("bench_password_123");
    account.max_download_bytes = 10 * 1024 * 1024 * 1024;
    account.upload_bytes = 1024 * 1024;
    account.download_bytes = 2048 * 1024;
    account.expiration_days = 365;
    account.account_creation_date = Some("2026-01-01".to_string());
    account
}

fn bench_evaluate(c: &mut Criterion) {
    let account = limited_account();

    let mut group = c.benchmark_group("evaluate");

    group.bench_function("allowed", |b| {
        b.iter(|| {
            evaluate(
                black_box(Some(&account)),
                black_box("bench_password_123"),
                black_box(TODAY),
            )
        })
    });

    group.bench_function("wrong_password", |b| {
        b.iter(|| {
            evaluate(
                black_box(Some(&account)),
                black_box("wrong"),
                black_box(TODAY),
            )
        })
    });

    group.bench_function("not_found", |b| {
        b.iter(|| evaluate(black_box(None), black_box("x"), black_box(TODAY)))
    });

    let mut blocked = limited_account();
    blocked.blocked = true;
    group.bench_function("blocked", |b| {
        b.iter(|| {
            evaluate(
                black_box(Some(&blocked)),
                black_box("bench_password_123"),
                black_box(TODAY),
            )
        })
    });

    group.finish();
}

fn registry_with_users(count: usize) -> Registry {
    let accounts: HashMap<String, Account> = (0..count)
        .map(|i| (format!("user_{i}"), limited_account()))
        .collect();
    Registry::from_accounts(accounts)
}

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    for count in [10usize, 100, 1000] {
        let registry = registry_with_users(count);
        let username = format!("user_{}", count / 2);
        group.bench_function(format!("get_{count}_users"), |b| {
            b.iter(|| registry.get(black_box(&username)))
        });
    }

    let registry = registry_with_users(1000);
    group.bench_function("get_1000_users_miss", |b| {
        b.iter(|| registry.get(black_box("nonexistent_user")))
    });

    group.bench_function("record_usage_1000_users", |b| {
        b.iter(|| registry.record_usage(black_box("user_500"), black_box(512), black_box(4096)))
    });

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_registry);

criterion_main!(benches);
