//! Query pipeline and aggregate benchmarks.
//!
//! Run with: cargo bench -p farmbook-query

#![allow(missing_docs)]

use std::hint::black_box;

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use farmbook_core::Record;
use farmbook_query::{
    aggregate_groups, balance_check, query, DateRange, OrderSpec, QuerySpec, Schema,
    SortDirection,
};
use rust_decimal::Decimal;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
}

/// Generate a balanced journal of two-leg transactions.
fn generate_journal(num_transactions: usize) -> Vec<Record> {
    let mut records = Vec::with_capacity(num_transactions * 2);

    let accounts = ["Feed Expense", "Vet Expense", "Livestock", "Fuel", "Labour"];
    let descriptions = ["Dairy meal", "Hay bales", "Vaccination", "Diesel", "Casual wages"];

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    for i in 0..num_transactions {
        let date = start + chrono::Days::new((i % 365) as u64);
        let amount = Decimal::new(1_000 + (i as i64 % 500) * 25, 0);
        let reference = format!("JV-{i}");
        let description = descriptions[i % descriptions.len()];

        records.push(
            Record::new(format!("{i}-dr"), date, description)
                .with_reference(reference.clone())
                .with_account(accounts[i % accounts.len()])
                .with_debit(amount),
        );
        records.push(
            Record::new(format!("{i}-cr"), date, description)
                .with_reference(reference)
                .with_account("Bank")
                .with_credit(amount),
        );
    }

    records
}

fn bench_search(c: &mut Criterion) {
    let records = generate_journal(1000);
    let schema = Schema::general_ledger();

    let mut group = c.benchmark_group("query_search");
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("search_description", |b| {
        let spec = QuerySpec::new().search("meal");
        b.iter(|| query(black_box(&schema), black_box(&records), black_box(&spec), today()));
    });

    group.finish();
}

fn bench_filter_sort(c: &mut Criterion) {
    let records = generate_journal(1000);
    let schema = Schema::general_ledger();

    let mut group = c.benchmark_group("query_filter_sort");
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("filter_account_sort_debit", |b| {
        let spec = QuerySpec::new()
            .filter("account", "Feed Expense")
            .date_range(DateRange::Last90Days)
            .sort_by("debit", SortDirection::Descending);
        b.iter(|| query(black_box(&schema), black_box(&records), black_box(&spec), today()));
    });

    group.bench_function("sort_account_then_date", |b| {
        let spec = QuerySpec::new()
            .sort_by("account", SortDirection::Ascending)
            .then_by(OrderSpec::desc("date"));
        b.iter(|| query(black_box(&schema), black_box(&records), black_box(&spec), today()));
    });

    group.finish();
}

fn bench_aggregates(c: &mut Criterion) {
    let records = generate_journal(1000);

    let mut group = c.benchmark_group("aggregate");
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("balance_check", |b| {
        b.iter(|| balance_check(black_box(&records)));
    });

    group.bench_function("group_by_account_sum_debit", |b| {
        b.iter(|| aggregate_groups(black_box(&records), "account", "debit"));
    });

    group.finish();
}

fn bench_query_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_scaling");
    let schema = Schema::general_ledger();
    let spec = QuerySpec::new()
        .search("e")
        .sort_by("credit", SortDirection::Descending);

    for size in [100, 500, 1000, 5000] {
        let records = generate_journal(size);

        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| query(black_box(&schema), black_box(records), black_box(&spec), today()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_search,
    bench_filter_sort,
    bench_aggregates,
    bench_query_scaling
);
criterion_main!(benches);
