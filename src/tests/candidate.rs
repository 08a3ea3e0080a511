use super::*;
use crate::engine::Engine;
use crate::test_utils::with_solver;

// ========== PRUNING ==========

/// `pair A A a1` with `R' = Eq ==> Eq`, related to itself.
fn pair_engine(params: Option<usize>) -> (Engine, TermId, TermId) {
    let mut engine = Engine::new();
    let big_a = engine.constant("A");
    let a1 = engine.constant("a1");
    let pair = engine.app("pair", &[big_a, big_a, a1]);
    let rel = engine.arrow(engine.eq(), engine.eq());
    engine.register_fact(rel, pair, pair, engine.constant("w"));
    if let Some(p) = params {
        engine.register_parameter_count(engine.sym("pair"), p);
    }
    (engine, big_a, a1)
}

#[test]
fn parameter_count_selects_with_one_probe() {
    let (engine, big_a, a1) = pair_engine(Some(2));
    let left = engine.app("pair", &[big_a, big_a, a1, engine.var(1)]);
    let right = engine.app("pair", &[big_a, big_a, a1, engine.var(2)]);
    let goal = Goal::related(engine.var(0), left, right);

    let solution = engine.solve(&goal);
    assert!(solution.is_solved());
    assert_eq!(solution.stats.candidate_probes, 1);
    assert_eq!(solution.binding(0), Some(engine.eq()));
}

#[test]
fn without_parameter_count_prefixes_are_enumerated() {
    let (engine, big_a, a1) = pair_engine(None);
    let left = engine.app("pair", &[big_a, big_a, a1, engine.var(1)]);
    let right = engine.app("pair", &[big_a, big_a, a1, engine.var(2)]);
    let goal = Goal::related(engine.var(0), left, right);

    let solution = engine.solve(&goal);
    assert!(solution.is_solved());
    // Length 4 finds nothing, length 3 finds the fact.
    assert_eq!(solution.stats.candidate_probes, 2);
}

#[test]
fn select_prefers_longest_prefix() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let a = engine.constant("a");
    let w = engine.constant("w");
    let f0 = engine.constant("f");
    let f1 = engine.app("f", &[a]);
    let short = engine.register_fact(r, f0, f0, w);
    let long = engine.register_fact(r, f1, f1, w);

    let term = engine.app("f", &[a, a]);
    let goal = Goal::related(r, term, term);
    with_solver(&engine, &goal, |s| {
        let found = select(s, Anchor::Left, term).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source, Source::Fact(long));
        assert_eq!(found[0].consumed, 1);
        assert_ne!(found[0].source, Source::Fact(short));
        assert_eq!(s.stats().candidate_probes, 2);
    });
}

#[test]
fn hypotheses_come_before_facts() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let a = engine.constant("a");
    let b = engine.constant("b");
    let fact = engine.register_fact(r, a, b, engine.constant("w"));
    let goal = Goal::related(r, a, b);

    with_solver(&engine, &goal, |s| {
        let h = crate::solver::Hypothesis {
            rel: r,
            left: a,
            right: b,
            witness: engine.constant("h"),
        };
        let found = s.with_hypotheses([h], |s| select(s, Anchor::Left, a).unwrap());
        let sources: Vec<Source> = found.iter().map(|c| c.source).collect();
        assert_eq!(sources, vec![Source::Hypothesis(0), Source::Fact(fact)]);
    });
}

#[test]
fn schematic_facts_are_renamed_per_use() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let fx = engine.app("f", &[engine.var(0)]);
    let gx = engine.app("g", &[engine.var(0)]);
    engine.register_fact(r, fx, gx, engine.constant("w"));

    let a = engine.constant("a");
    let term = engine.app("f", &[a]);
    let goal = Goal::related(r, term, engine.var(0));
    with_solver(&engine, &goal, |s| {
        let first = select(s, Anchor::Left, term).unwrap();
        let second = select(s, Anchor::Left, term).unwrap();
        assert_ne!(first[0].left, second[0].left);
        assert_ne!(first[0].left, fx);
    });

    let solution = engine.solve(&goal);
    assert!(solution.is_solved());
    assert_eq!(solution.binding(0), Some(engine.app("g", &[a])));
}

#[test]
fn select_on_placeholder_is_no_candidate() {
    let engine = Engine::new();
    let goal = Goal::related(engine.eq(), engine.var(0), engine.var(1));
    with_solver(&engine, &goal, |s| {
        let v = s.terms().var(0);
        assert!(matches!(
            select(s, Anchor::Left, v),
            Err(SolveError::NoCandidate(_))
        ));
        assert_eq!(s.stats().candidate_probes, 0);
    });
}

// ========== ANCHORS ==========

#[test]
fn right_anchor_binds_the_left_side() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let a = engine.constant("a");
    let gb = engine.app("g", &[engine.constant("b")]);
    engine.register_fact(r, a, gb, engine.constant("w"));

    let solution = engine.solve(&Goal::related(r, engine.var(0), gb));
    assert!(solution.proof().unwrap().uses_rule("mono_right"));
    assert_eq!(solution.binding(0), Some(a));
}

#[test]
fn right_anchor_eliminates_extra_arguments() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let b = engine.constant("b");
    let rel = engine.arrow(engine.eq(), r);
    engine.register_fact(rel, engine.constant("f"), engine.constant("g"), engine.constant("w"));

    let gb = engine.app("g", &[b]);
    let solution = engine.solve(&Goal::related(r, engine.var(0), gb));
    assert!(solution.is_solved());
    assert_eq!(solution.binding(0), Some(engine.app("f", &[b])));
}

#[test]
fn both_sides_placeholders_has_no_candidate() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let a = engine.constant("a");
    engine.register_fact(r, a, a, engine.constant("w"));

    let solution = engine.solve(&Goal::related(r, engine.var(0), engine.var(1)));
    assert!(matches!(solution.error(), Some(SolveError::NoCandidate(_))));
    assert_eq!(solution.stats.candidate_probes, 0);
}

// ========== ELIMINATION ==========

#[test]
fn arrow_elimination_relates_arguments() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let s = engine.constant("S");
    let a = engine.constant("a");
    let b = engine.constant("b");
    let w = engine.constant("w");
    engine.register_fact(engine.arrow(r, s), engine.constant("f"), engine.constant("g"), w);
    engine.register_fact(r, a, b, w);

    let fa = engine.app("f", &[a]);
    let gb = engine.app("g", &[b]);
    assert!(engine.solve(&Goal::related(s, fa, gb)).is_solved());

    // No fact relates b and a under R.
    let fb = engine.app("f", &[b]);
    let ga = engine.app("g", &[a]);
    assert!(engine.solve(&Goal::related(s, fb, ga)).is_failed());
}

#[test]
fn curried_elimination_consumes_every_argument() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let s = engine.constant("S");
    let t = engine.constant("T");
    let (a, b, c, d) = (
        engine.constant("a"),
        engine.constant("b"),
        engine.constant("c"),
        engine.constant("d"),
    );
    let w = engine.constant("w");
    let rel = engine.arrow(r, engine.arrow(s, t));
    engine.register_fact(rel, engine.constant("f"), engine.constant("g"), w);
    engine.register_fact(r, a, b, w);
    engine.register_fact(s, c, d, w);

    let left = engine.app("f", &[a, c]);
    let right = engine.app("g", &[b, d]);
    assert!(engine.solve(&Goal::related(t, left, right)).is_solved());
}

#[test]
fn flip_elimination_swaps_the_pair() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let s = engine.constant("S");
    let a = engine.constant("a");
    let b = engine.constant("b");
    let w = engine.constant("w");
    let rel = engine.flip(engine.arrow(r, s));
    engine.register_fact(rel, engine.constant("f"), engine.constant("g"), w);
    engine.register_fact(r, b, a, w);

    let fa = engine.app("f", &[a]);
    let gb = engine.app("g", &[b]);
    assert!(engine.solve(&Goal::related(engine.flip(s), fa, gb)).is_solved());
}

#[test]
fn forall_elimination_instantiates_the_family() {
    let mut engine = Engine::new();
    let e = engine.constant("E");
    let fam = engine.constant("fam");
    let a = engine.constant("a");
    let b = engine.constant("b");
    let ew = engine.constant("ew");
    engine.register_fact(engine.forall(e, fam), engine.constant("f"), engine.constant("g"), engine.constant("w"));
    engine.register_fact(e, a, b, ew);

    let rel = engine.named("fam", &[a, b, ew]);
    let fa = engine.app("f", &[a]);
    let gb = engine.app("g", &[b]);
    assert!(engine.solve(&Goal::related(rel, fa, gb)).is_solved());

    let other = engine.named("fam", &[a, b, engine.constant("other")]);
    assert!(engine.solve(&Goal::related(other, fa, gb)).is_failed());
}

#[test]
fn residual_relation_bridged_through_subrel() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let s = engine.constant("S");
    let a = engine.constant("a");
    let w = engine.constant("w");
    engine.register_fact(r, a, a, w);

    let goal = Goal::related(s, a, a);
    assert!(matches!(
        engine.solve(&goal).error(),
        Some(SolveError::UnbridgeableGap(_))
    ));

    engine.register_subrel(r, s, w);
    let solution = engine.solve(&goal);
    assert!(solution.proof().unwrap().uses_rule("subrel_fact"));
}

#[test]
fn other_subrel_bridges_are_tried_after_a_later_failure() {
    let mut engine = Engine::new();
    let (t, s) = (engine.constant("T"), engine.constant("S"));
    let (a, b) = (engine.constant("a"), engine.constant("b"));
    let (c, d) = (engine.constant("c"), engine.constant("d"));
    let w = engine.constant("w");
    let x = engine.var(0);
    let rel = engine.arrow(x, engine.arrow(x, engine.eq()));
    engine.register_fact(rel, engine.constant("h"), engine.constant("h"), w);
    engine.register_fact(t, a, c, w);
    engine.register_fact(s, b, d, w);
    engine.register_subrel(t, s, w);

    // `T a c` first bridges to `X = T`, which `S b d` cannot meet; bridged
    // through `T ⊆ S` instead it gives `X = S`.
    let goal = Goal::related(engine.eq(), engine.app("h", &[a, b]), engine.app("h", &[c, d]));
    let solution = engine.solve(&goal);
    assert!(solution.is_solved());
    assert!(solution.proof().unwrap().uses_rule("subrel_fact"));
}

#[test]
fn later_candidates_tried_when_completion_fails() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let a = engine.constant("a");
    let b = engine.constant("b");
    let c = engine.constant("c");
    let w = engine.constant("w");
    engine.register_fact(r, a, b, w);
    let second = engine.register_fact(r, a, c, w);

    let solution = engine.solve(&Goal::related(r, a, c));
    let proof = solution.proof().unwrap();
    let mut found = false;
    if let Proof::Step { premises, .. } = proof {
        found = premises
            .iter()
            .any(|p| matches!(p, Proof::Fact { id, .. } if *id == second));
    }
    assert!(found);
}
