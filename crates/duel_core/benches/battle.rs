//! Battle benchmarks for duel_core.
//!
//! Run with: `cargo bench -p duel_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use duel_core::action::{magical_damage, physical_damage};
use duel_test_utils::fixtures::{run_to_completion, seeded_npc_duel};

/// Damage formula throughput.
pub fn damage_benchmark(c: &mut Criterion) {
    c.bench_function("physical_damage", |b| {
        b.iter(|| physical_damage(black_box(850), black_box(420), black_box(false)))
    });
    c.bench_function("magical_damage", |b| {
        b.iter(|| magical_damage(black_box(850), black_box(420), black_box(150), black_box(true)))
    });
}

/// Full NPC-vs-NPC duels from a fresh seeded battle.
pub fn duel_benchmark(c: &mut Criterion) {
    c.bench_function("npc_duel_to_completion", |b| {
        b.iter_batched(
            || seeded_npc_duel(black_box(42), 5, 7),
            |mut battle| run_to_completion(&mut battle, 500),
            BatchSize::SmallInput,
        )
    });
    c.bench_function("snapshot_state_hash", |b| {
        let battle = seeded_npc_duel(7, 4, 4);
        b.iter(|| battle.snapshot().state_hash())
    });
}

criterion_group!(benches, damage_benchmark, duel_benchmark);
criterion_main!(benches);
