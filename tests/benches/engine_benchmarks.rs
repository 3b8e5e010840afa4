//! # Engine Benchmarks
//!
//! Hot paths of block parsing:
//! - descendant walks over long unconfirmed spend chains
//! - the fork-root heuristic over a full fork window
//! - a block-level conflict scan against many tracked transactions
//!
//! ```bash
//! cargo bench --package tg-tests --bench engine_benchmarks
//! cargo bench --package tg-tests --bench engine_benchmarks -- spend_graph
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_types::test_utils::{label_hash, make_block, make_tx, tx_id};
use shared_types::{Hash, OutPoint, ZERO_HASH};
use std::time::Duration;
use tg_01_tx_store::{
    has_recent_fork, InMemoryTransactionStore, NewBlock, NewTrackedTransaction, SpendGraph,
    TransactionStore,
};

/// `tx_id(0) <- tx_id(1) <- ... <- tx_id(len - 1)`, each spending output 0 of
/// its predecessor.
fn spend_chain(len: u64) -> SpendGraph {
    let mut graph = SpendGraph::default();
    for n in 1..len {
        graph.add_edge(tx_id(n - 1), tx_id(n));
    }
    graph
}

fn bench_spend_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("spend_graph/descendants");
    for len in [1_000u64, 10_000, 100_000] {
        let graph = spend_chain(len);
        let root = [tx_id(0)];
        group.throughput(Throughput::Elements(len));
        group.bench_with_input(BenchmarkId::from_parameter(len), &graph, |b, graph| {
            b.iter(|| black_box(graph.descendants(black_box(&root))).len())
        });
    }
    group.finish();
}

fn bench_fork_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("fork_root/has_recent_fork");
    for stored in [1_000u64, 50_000] {
        // A linear chain with one stale fork at the very bottom: the worst
        // case, since the whole window is scanned without a hit.
        let heights: Vec<u64> = (0..stored).chain(std::iter::once(0)).collect();
        let tip = stored - 1;
        group.bench_with_input(BenchmarkId::from_parameter(stored), &heights, |b, heights| {
            b.iter(|| has_recent_fork(heights.iter().copied(), black_box(tip), black_box(144)))
        });
    }
    group.finish();
}

fn bench_block_scan(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime");

    let mut group = c.benchmark_group("store/block_scan");
    group.measurement_time(Duration::from_secs(5));
    for tracked in [1_000u64, 10_000] {
        let store = InMemoryTransactionStore::new();
        let (block_id, triples) = runtime.block_on(async {
            for n in 0..tracked {
                store
                    .insert_tracked_transaction(NewTrackedTransaction {
                        txid: tx_id(n),
                        double_spend_check: true,
                        inputs: vec![OutPoint::new(label_hash(&format!("out-{n}")), 0)],
                        ..NewTrackedTransaction::default()
                    })
                    .await
                    .expect("tracked insert");
            }

            let genesis = make_block(0, 0, ZERO_HASH, vec![]);
            let main = make_block(1, 0, genesis.hash(), vec![]);
            // Every tenth tracked output is spent again by the competing block.
            let spenders: Vec<_> = (0..tracked)
                .step_by(10)
                .map(|n| {
                    let txid: Hash = label_hash(&format!("rival-{n}"));
                    make_tx(txid, vec![OutPoint::new(label_hash(&format!("out-{n}")), 0)])
                })
                .collect();
            let fork = make_block(1, 1, genesis.hash(), spenders);
            for block in [&genesis, &main] {
                store
                    .insert_block(NewBlock::from(&block.header))
                    .await
                    .expect("block insert");
            }
            let fork_id = store
                .insert_block(NewBlock::from(&fork.header))
                .await
                .expect("block insert")
                .expect("fresh block");
            (fork_id, fork.input_triples())
        });

        group.throughput(Throughput::Elements(tracked));
        group.bench_with_input(BenchmarkId::from_parameter(tracked), &triples, |b, triples| {
            b.iter(|| {
                runtime.block_on(async {
                    store
                        .scan_and_insert_block_double_spends(black_box(triples), 6, block_id)
                        .await
                        .expect("scan")
                })
            })
        });
    }
    group.finish();
}

criterion_group!(
    name = engine_benches;
    config = Criterion::default().sample_size(50);
    targets = bench_spend_graph, bench_fork_root, bench_block_scan
);

criterion_main!(engine_benches);
