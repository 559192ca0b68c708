// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the best-fit arena layout.

use buffer_planner::{plan, Liveness, PlanRequest, StorageClass};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Deterministic xorshift; the layout cost depends on interval shape,
/// not on randomness quality.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

fn make_requests(n: usize) -> Vec<PlanRequest> {
    let mut rng = XorShift(0x9e3779b97f4a7c15);
    (0..n)
        .map(|_| {
            let first = (rng.next() % (n as u64)) as usize;
            let last = first + (rng.next() % 6) as usize;
            let size = 64 * (1 + (rng.next() % 64) as usize);
            PlanRequest::new(size, StorageClass::Scratch, Liveness::new(first, last))
        })
        .collect()
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_layout");
    for n in [16usize, 128, 1024] {
        let requests = make_requests(n);
        group.bench_with_input(BenchmarkId::new("best_fit", n), &requests, |b, reqs| {
            b.iter(|| plan(black_box(reqs), true).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
