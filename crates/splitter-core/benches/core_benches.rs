//! Criterion benchmarks for splitter-core hot paths.
//!
//! Covers: single share computation, a full 255-member split, and an
//! all-or-nothing bank batch of the same size.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use splitter_core::bank::MemoryBank;
use splitter_core::constants::{MAX_DISTRIBUTION_AMOUNT, MAX_MEMBERSHIPS};
use splitter_core::math::{share, split, total_weight};
use splitter_core::traits::AssetBank;
use splitter_core::types::{Address, AssetId, Transfer};

fn weights(n: usize) -> Vec<u32> {
    (0..n).map(|i| (i as u32 + 1) * 1_000).collect()
}

fn bench_share(c: &mut Criterion) {
    c.bench_function("share_at_cap", |b| {
        b.iter(|| share(black_box(u32::MAX), black_box(u64::MAX / 2), black_box(MAX_DISTRIBUTION_AMOUNT)))
    });
}

fn bench_split(c: &mut Criterion) {
    let w = weights(MAX_MEMBERSHIPS);
    let total = total_weight(w.iter().copied()).unwrap();
    c.bench_function("split_255_members", |b| {
        b.iter(|| split(black_box(&w), total, black_box(1_000_000_000_000)))
    });
}

fn bench_bank_batch(c: &mut Criterion) {
    let asset = AssetId::Token(Address::from_seed(0xEE));
    let source = Address::from_seed(0);
    let mut bank = MemoryBank::new();
    bank.mint(asset, &source, u64::MAX as u128).unwrap();
    let legs: Vec<Transfer> = (0..MAX_MEMBERSHIPS)
        .map(|i| Transfer {
            asset,
            from: source,
            to: Address::from_seed(i as u8),
            amount: 1,
        })
        .collect();
    c.bench_function("bank_batch_255_legs", |b| {
        b.iter(|| {
            let mut staged = bank.clone();
            staged.execute(&source, black_box(&legs)).unwrap();
        })
    });
}

criterion_group!(benches, bench_share, bench_split, bench_bank_batch);
criterion_main!(benches);
