//! Criterion benchmarks for flips and lamination transport on the flute.
//! Focus sizes: number of flipped squares in {1, 10, 50, 100}.
//! Results land under target/criterion.

use bigger::api::{flute, FlipSelector, Side};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

fn bench_flips(c: &mut Criterion) {
    let mut group = c.benchmark_group("flip");
    for &n in &[1i64, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::new("link_after_flip", n), &n, |b, &n| {
            b.iter_batched(
                || flute().triangulation().clone(),
                |t| {
                    let h = t.flip(FlipSelector::predicate(move |s: &Side<i64>| {
                        s.orientation && s.edge > 0 && s.edge % 3 == 1 && s.edge < 3 * n
                    }));
                    for e in 0..3 * n {
                        black_box(h.target().link(&Side::pos(e)));
                    }
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("transport_chain", n), &n, |b, &n| {
            let t = flute().triangulation().clone();
            let arcs = t.lamination_from_weights((0..n).map(|k| (3 * k + 1, -1)));
            let word: Vec<_> = (0..n).map(|k| bigger::api::Term::Edge(3 * k + 4)).collect();
            let h = t.encode(word);
            b.iter(|| h.apply(&arcs).complexity())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flips);
criterion_main!(benches);
