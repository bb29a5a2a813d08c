//! Cursor-tracker admission throughput.
//!
//! The tracker sits on the hot path of every incremental sync — one admit
//! call per fetched record — so regressions here show up directly in sync
//! wall time.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Map};
use vnfeed_core::cursor::CursorTracker;
use vnfeed_core::record::{Marker, Record};

fn seq_record(ticker: &str, id: i64) -> Record {
    let mut fields = Map::new();
    fields.insert("id".into(), json!(id));
    Record::from_object(fields, ticker)
}

fn bench_admit(c: &mut Criterion) {
    let tickers: Vec<String> = (0..100).map(|i| format!("SYM{i:03}")).collect();

    c.bench_function("admit_10k_fresh_records", |b| {
        let records: Vec<Record> = (0..10_000)
            .map(|i| seq_record(&tickers[(i % 100) as usize], i / 100))
            .collect();
        b.iter(|| {
            let mut tracker = CursorTracker::new("id");
            tracker.initialize(&tickers, Marker::seq_start());
            let mut admitted = 0usize;
            for record in &records {
                if tracker.admit(black_box(record)) {
                    admitted += 1;
                }
            }
            black_box(admitted)
        });
    });

    c.bench_function("admit_10k_replayed_records", |b| {
        let records: Vec<Record> = (0..10_000)
            .map(|i| seq_record(&tickers[(i % 100) as usize], i / 100))
            .collect();
        let mut warm = CursorTracker::new("id");
        warm.initialize(&tickers, Marker::seq_start());
        for record in &records {
            warm.admit(record);
        }
        b.iter(|| {
            let mut tracker = warm.clone();
            let mut admitted = 0usize;
            for record in &records {
                if tracker.admit(black_box(record)) {
                    admitted += 1;
                }
            }
            black_box(admitted)
        });
    });

    c.bench_function("sort_ascending_one_page", |b| {
        let tracker = CursorTracker::new("id");
        let page: Vec<Record> = (0..100).rev().map(|i| seq_record("TCB", i)).collect();
        b.iter(|| {
            let mut batch = page.clone();
            tracker.sort_ascending(black_box(&mut batch));
            black_box(batch)
        });
    });
}

criterion_group!(benches, bench_admit);
criterion_main!(benches);
