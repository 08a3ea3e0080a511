//! Solver benchmarks using Criterion.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure:
//! - Eliminating curried arrow facts of growing arity
//! - Bridging through chains of subrel facts
//! - Candidate selection with and without a parameter count

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relmono::{Engine, Goal, TermId};

/// `f ~ g` under `R ==> R ==> .. ==> R` with `n` arrows, plus `R a b`.
fn arrow_chain(n: usize) -> (Engine, Goal) {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let a = engine.constant("a");
    let b = engine.constant("b");
    let w = engine.constant("w");

    let mut rel = r;
    for _ in 0..n {
        rel = engine.arrow(r, rel);
    }
    engine.register_fact(rel, engine.constant("f"), engine.constant("g"), w);
    engine.register_fact(r, a, b, w);

    let left = engine.app("f", &vec![a; n]);
    let right = engine.app("g", &vec![b; n]);
    (engine, Goal::related(r, left, right))
}

fn bench_arrow_chain(c: &mut Criterion) {
    // Solver spans and events go to stderr under `--features tracing`.
    relmono::trace::init_subscriber();
    let mut group = c.benchmark_group("arrow_chain");

    for n in [1, 4, 16] {
        let (engine, goal) = arrow_chain(n);
        group.bench_with_input(BenchmarkId::new("arity", n), &n, |b, _| {
            b.iter(|| black_box(engine.solve(black_box(&goal))).is_solved())
        });
    }

    group.finish();
}

/// `R0 ⊆ R1 ⊆ .. ⊆ Rn` with a fact under `R0` and a goal under `Rn`.
fn subrel_chain(n: usize) -> (Engine, Goal) {
    let mut engine = Engine::new();
    let w = engine.constant("w");
    let rels: Vec<TermId> = (0..=n).map(|i| engine.constant(&format!("R{}", i))).collect();
    for pair in rels.windows(2) {
        engine.register_subrel(pair[0], pair[1], w);
    }
    let a = engine.constant("a");
    engine.register_fact(rels[0], a, a, w);
    (engine, Goal::related(rels[n], a, a))
}

fn bench_subrel_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("subrel_chain");

    for n in [2, 8, 24] {
        let (engine, goal) = subrel_chain(n);
        group.bench_with_input(BenchmarkId::new("length", n), &n, |b, _| {
            b.iter(|| black_box(engine.solve(black_box(&goal))).is_solved())
        });
    }

    group.finish();
}

/// Many facts about `pair` prefixes; the goal applies `pair` to `width`
/// arguments.
fn wide_pairs(width: usize, params: Option<usize>) -> (Engine, Goal) {
    let mut engine = Engine::new();
    let w = engine.constant("w");
    let eq_chain = (0..width).fold(engine.eq(), |rel, _| engine.arrow(engine.eq(), rel));
    let args: Vec<TermId> = (0..width)
        .map(|i| engine.constant(&format!("c{}", i)))
        .collect();
    for k in 0..width {
        let prefix = engine.app("pair", &args[..k]);
        engine.register_fact(eq_chain, prefix, prefix, w);
    }
    if let Some(p) = params {
        engine.register_parameter_count(engine.sym("pair"), p);
    }
    let full = engine.app("pair", &args);
    let goal = Goal::related(engine.var(0), full, full);
    (engine, goal)
}

fn bench_candidate_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("candidate_selection");

    for (label, params) in [("prefixes", None), ("parameter_count", Some(2))] {
        let (engine, goal) = wide_pairs(12, params);
        group.bench_function(label, |b| {
            b.iter(|| black_box(engine.solve(black_box(&goal))).is_solved())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_arrow_chain,
    bench_subrel_chain,
    bench_candidate_selection
);
criterion_main!(benches);
