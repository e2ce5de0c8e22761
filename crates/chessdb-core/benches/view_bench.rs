//! View pipeline benchmarks
//!
//! Measures backlog replay through the full tag/multiplex/gate/fold/dedup
//! chain and the change filter on its own.
//!
//! Run with: cargo bench --bench view_bench

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use futures::executor::block_on;
use futures::{stream, StreamExt};

use chessdb_core::dedup::{same_len, structural};
use chessdb_core::{Dedup, LiveView, Reducer, TailItem, TailStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chan {
    Left,
    Right,
}

/// Keeps every even record.
struct Evens;

impl Reducer for Evens {
    type Event = u64;
    type State = Vec<u64>;
    type Output = Vec<u64>;

    fn apply(&self, state: &mut Vec<u64>, event: &u64) {
        if event % 2 == 0 {
            state.push(*event);
        }
    }

    fn project(&self, state: &Vec<u64>) -> Vec<u64> {
        state.clone()
    }
}

fn backlog(n: u64) -> TailStream<u64, ()> {
    let mut items: Vec<Result<TailItem<u64>, ()>> =
        (0..n).map(|i| Ok(TailItem::Record(i))).collect();
    items.push(Ok(TailItem::Sync));
    stream::iter(items).boxed()
}

fn bench_backlog_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("backlog_replay");
    for n in [1_000u64, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let view = LiveView::new(
                    vec![(Chan::Left, backlog(n)), (Chan::Right, backlog(n))],
                    Evens,
                    structural,
                );
                black_box(block_on(view.collect::<Vec<_>>()))
            });
        });
    }
    group.finish();
}

fn bench_dedup_admit(c: &mut Criterion) {
    let snapshot: Vec<u64> = (0..256).collect();

    c.bench_function("dedup_structural_unchanged", |b| {
        let mut filter = Dedup::new(structural::<Vec<u64>>);
        b.iter(|| black_box(filter.admit(snapshot.clone())));
    });

    c.bench_function("dedup_same_len_unchanged", |b| {
        let mut filter = Dedup::new(same_len::<u64>);
        b.iter(|| black_box(filter.admit(snapshot.clone())));
    });
}

criterion_group!(benches, bench_backlog_replay, bench_dedup_admit);
criterion_main!(benches);
