//! Intrusive list operations over Vec and Pool storage.
//!
//! Run with: cargo bench -p stratum-collections

use std::collections::VecDeque;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use stratum_alloc::{BlockId, Pool, PoolBuilder};
use stratum_collections::{Index, List, linked};

const NODES: usize = 4096;

struct Order {
    qty: u64,
    next: usize,
    prev: usize,
}

linked!(Order, usize);

struct PooledOrder {
    qty: u64,
    next: BlockId,
    prev: BlockId,
}

linked!(PooledOrder, BlockId);

fn vec_storage() -> Vec<Order> {
    (0..NODES as u64)
        .map(|qty| Order {
            qty,
            next: usize::NONE,
            prev: usize::NONE,
        })
        .collect()
}

// ============================================================================
// Push/pop at the ends
// ============================================================================

fn bench_fifo(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo");
    group.throughput(Throughput::Elements(NODES as u64));

    let mut storage = vec_storage();
    let mut list: List<usize> = List::new();

    group.bench_function("list/vec", |b| {
        b.iter(|| {
            for idx in 0..NODES {
                list.push_back(&mut storage, idx);
            }
            while let Some(idx) = list.pop_front(&mut storage) {
                black_box(idx);
            }
        });
    });

    let mut pool: Pool<PooledOrder> = PoolBuilder::default().blocks_per_chunk(NODES).build().unwrap();
    let ids: Vec<_> = (0..NODES as u64)
        .map(|qty| {
            pool.create(PooledOrder {
                qty,
                next: BlockId::NONE,
                prev: BlockId::NONE,
            })
            .unwrap()
        })
        .collect();
    let mut pooled: List<BlockId> = List::new();

    group.bench_function("list/pool", |b| {
        b.iter(|| {
            for &id in &ids {
                pooled.push_back(&mut pool, id);
            }
            while let Some(id) = pooled.pop_front(&mut pool) {
                black_box(pool.get(id).map(|o| o.qty));
            }
        });
    });

    let mut deque: VecDeque<usize> = VecDeque::with_capacity(NODES);

    group.bench_function("vecdeque", |b| {
        b.iter(|| {
            for idx in 0..NODES {
                deque.push_back(idx);
            }
            while let Some(idx) = deque.pop_front() {
                black_box(idx);
            }
        });
    });

    group.finish();
}

// ============================================================================
// Unlink from the middle in random order
// ============================================================================

fn bench_pop_current(c: &mut Criterion) {
    let mut group = c.benchmark_group("pop_current_random");
    group.throughput(Throughput::Elements(NODES as u64));

    let mut order: Vec<usize> = (0..NODES).collect();
    order.shuffle(&mut SmallRng::seed_from_u64(7));

    let mut storage = vec_storage();
    let mut list: List<usize> = List::new();

    group.bench_function("list/vec", |b| {
        b.iter(|| {
            for idx in 0..NODES {
                list.push_back(&mut storage, idx);
            }
            for &idx in &order {
                black_box(list.pop_current(&mut storage, idx));
            }
        });
    });

    group.finish();
}

// ============================================================================
// Traversal
// ============================================================================

fn bench_iter(c: &mut Criterion) {
    let mut group = c.benchmark_group("iter");
    group.throughput(Throughput::Elements(NODES as u64));

    let mut storage = vec_storage();
    let list = List::from_keys(&mut storage, 0..NODES);

    group.bench_function("forward", |b| {
        b.iter(|| black_box(list.iter(&storage).map(|o| o.qty).sum::<u64>()));
    });

    group.bench_function("reverse", |b| {
        b.iter(|| black_box(list.iter(&storage).rev().map(|o| o.qty).sum::<u64>()));
    });

    group.bench_function("len", |b| {
        b.iter(|| black_box(list.len(&storage)));
    });

    group.bench_function("for_each_mut", |b| {
        b.iter(|| list.for_each_mut(&mut storage, |o| o.qty = black_box(o.qty + 1)));
    });

    group.finish();
}

criterion_group!(benches, bench_fifo, bench_pop_current, bench_iter);
criterion_main!(benches);
