//! Benchmark suite for the cause algebra.
//!
//! Covers the operations a scheduler leans on when many fibers fail:
//! 1. Building causes by incremental merging (`then`/`both`)
//! 2. Stack-safe folds and queries over deep trees
//! 3. Law-aware equality on deep and law-rewritten shapes
//! 4. Canonicalizing hash over deep and wide trees
//! 5. The sequence continuation-stack machine
//!
//! All benchmarks use deterministic inputs.

#![allow(missing_docs)]
#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use aftermath::util::DetHasher;
use aftermath::Cause;
use std::hash::{Hash, Hasher};

type BenchCause = Cause<u32, u32>;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn deep_then(depth: u32) -> BenchCause {
    let mut cause = Cause::fail(0);
    for i in 1..depth {
        cause = Cause::then(Cause::fail(i), cause);
    }
    cause
}

fn wide_both(width: u32) -> BenchCause {
    let mut cause = Cause::interrupt(0);
    for i in 1..width {
        cause = Cause::both(Cause::interrupt(i), cause);
    }
    cause
}

fn hash_of(cause: &BenchCause) -> u64 {
    let mut hasher = DetHasher::default();
    cause.hash(&mut hasher);
    hasher.finish()
}

// =============================================================================
// CONSTRUCTION AND FOLDS
// =============================================================================

fn bench_build_and_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_and_fold");

    for depth in [1_000u32, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("build_then", depth), &depth, |b, &depth| {
            b.iter(|| black_box(deep_then(depth)));
        });

        let cause = deep_then(depth);
        group.bench_with_input(BenchmarkId::new("failures", depth), &cause, |b, cause| {
            b.iter(|| black_box(cause.failures().len()));
        });

        group.bench_with_input(BenchmarkId::new("fold_count", depth), &cause, |b, cause| {
            b.iter(|| {
                cause.fold(
                    || 0usize,
                    |_| 1,
                    |_| 1,
                    |_| 1,
                    |l, r| l + r,
                    |l, r| l + r,
                    |inner, _| inner,
                )
            });
        });
    }

    group.finish();
}

// =============================================================================
// EQUALITY AND HASHING
// =============================================================================

fn bench_equality(c: &mut Criterion) {
    let mut group = c.benchmark_group("equality");

    for depth in [1_000u32, 10_000] {
        let left = deep_then(depth);
        let right = deep_then(depth);
        group.bench_with_input(
            BenchmarkId::new("deep_structural", depth),
            &(left, right),
            |b, (left, right)| {
                b.iter(|| black_box(left == right));
            },
        );
    }

    let factored = Cause::<u32, u32>::then(
        Cause::fail(1),
        Cause::both(Cause::fail(2), Cause::fail(3)),
    );
    let expanded = Cause::both(
        Cause::then(Cause::fail(1), Cause::fail(2)),
        Cause::then(Cause::fail(1), Cause::fail(3)),
    );
    group.bench_function("distributive_rewrite", |b| {
        b.iter(|| black_box(factored == expanded));
    });

    group.finish();
}

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");

    for depth in [1_000u32, 10_000] {
        let chain = deep_then(depth);
        group.bench_with_input(BenchmarkId::new("deep_then", depth), &chain, |b, cause| {
            b.iter(|| black_box(hash_of(cause)));
        });

        let fan = wide_both(depth);
        group.bench_with_input(BenchmarkId::new("wide_both", depth), &fan, |b, cause| {
            b.iter(|| black_box(hash_of(cause)));
        });
    }

    group.finish();
}

// =============================================================================
// SEQUENCE MACHINE
// =============================================================================

fn bench_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequence");

    for depth in [1_000u32, 10_000] {
        let mut cause: Cause<u32, Result<u32, u32>> = Cause::fail(Err(0));
        for i in 1..depth {
            cause = Cause::then(Cause::fail(Err(i)), cause);
        }
        group.bench_with_input(
            BenchmarkId::new("all_failures", depth),
            &cause,
            |b, cause| {
                b.iter(|| black_box(aftermath::sequence_result(cause).is_err()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build_and_fold,
    bench_equality,
    bench_hashing,
    bench_sequence
);
criterion_main!(benches);
