//! Tree operation benchmarks.
//!
//! Run with: `cargo bench -p mcts`
//!
//! These benchmarks measure:
//! - Batch selection on trees of different sizes
//! - Backpropagation from deep leaves
//! - Tree statistics over a large arena

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mcts::{MctsTree, NodeId};

/// Build a tree of `size` nodes where node i hangs under node i / branching.
fn build_tree(size: usize, branching: usize) -> MctsTree<u32> {
    let mut tree = MctsTree::empty();
    for i in 1..size {
        let parent = NodeId(((i - 1) / branching) as u32);
        let child = tree.add_child(parent, i as u32);
        tree.backpropagate(child, (i % 7) as f64 / 7.0);
    }
    tree
}

fn bench_select_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_batch");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("branching_4", size), &size, |b, &size| {
            let mut tree = build_tree(size, 4);
            b.iter(|| {
                let selected = tree.select_batch(8, 1.41);
                for &node in &selected {
                    tree.release(node);
                }
                black_box(selected)
            });
        });
    }

    group.finish();
}

fn bench_backpropagate(c: &mut Criterion) {
    let mut group = c.benchmark_group("backpropagate");

    for depth in [10, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("chain", depth), &depth, |b, &depth| {
            // branching 1 gives a single chain
            let mut tree = build_tree(depth + 1, 1);
            let leaf = NodeId(depth as u32);
            b.iter(|| tree.backpropagate(black_box(leaf), 0.5));
        });
    }

    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let tree = build_tree(10_000, 3);
    c.bench_function("tree_stats_10k", |b| b.iter(|| black_box(tree.stats())));
}

criterion_group!(benches, bench_select_batch, bench_backpropagate, bench_stats);
criterion_main!(benches);
