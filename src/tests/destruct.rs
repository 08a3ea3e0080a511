use super::*;
use crate::engine::Engine;
use crate::proof::Proof;
use crate::relators::Relators;

/// `match s [None => b0] [Some x => h x]` against the same shape over `t`.
fn option_matches(engine: &Engine) -> (TermId, TermId) {
    let left = engine.match_on(
        engine.constant("s"),
        &[
            engine.arm("None", 0, engine.constant("b0")),
            engine.arm("Some", 1, engine.constant("h")),
        ],
    );
    let right = engine.match_on(
        engine.constant("t"),
        &[
            engine.arm("None", 0, engine.constant("c0")),
            engine.arm("Some", 1, engine.constant("k")),
        ],
    );
    (left, right)
}

fn premise_count(proof: &Proof) -> usize {
    match proof {
        Proof::Step { premises, .. } => premises.len(),
        _ => 0,
    }
}

// ========== SCHEME ==========

#[test]
fn scheme_cases_relate_fields_under_hypotheses() {
    let mut engine = Engine::new();
    let relators = Relators::install(&mut engine);
    let r = engine.constant("R");
    let q = engine.constant("Q");
    let w = engine.constant("w");
    let option_r = relators.option(&engine, r);
    engine.register_fact(option_r, engine.constant("s"), engine.constant("t"), w);
    engine.register_fact(q, engine.constant("b0"), engine.constant("c0"), w);
    engine.register_fact(
        engine.arrow(r, q),
        engine.constant("h"),
        engine.constant("k"),
        w,
    );

    let (left, right) = option_matches(&engine);
    let solution = engine.solve(&Goal::related(q, left, right));
    let proof = solution.proof().unwrap();
    assert!(proof.uses_rule("destruct"));
    // Scrutinee proof plus one obligation per scheme case.
    assert_eq!(premise_count(proof), 3);
}

#[test]
fn scheme_case_fails_without_field_relation() {
    let mut engine = Engine::new();
    let relators = Relators::install(&mut engine);
    let r = engine.constant("R");
    let s2 = engine.constant("R2");
    let q = engine.constant("Q");
    let w = engine.constant("w");
    let option_r = relators.option(&engine, r);
    engine.register_fact(option_r, engine.constant("s"), engine.constant("t"), w);
    engine.register_fact(q, engine.constant("b0"), engine.constant("c0"), w);
    // h and k only preserve R2, which the Some fields are not related by.
    engine.register_fact(
        engine.arrow(s2, q),
        engine.constant("h"),
        engine.constant("k"),
        w,
    );

    let (left, right) = option_matches(&engine);
    assert!(engine.solve(&Goal::related(q, left, right)).is_failed());
}

#[test]
fn flipped_scrutinee_swaps_field_hypotheses() {
    let mut engine = Engine::new();
    let relators = Relators::install(&mut engine);
    let r = engine.constant("R");
    let q = engine.constant("Q");
    let w = engine.constant("w");
    let flipped = engine.flip(relators.option(&engine, r));
    engine.register_fact(flipped, engine.constant("s"), engine.constant("t"), w);
    engine.register_fact(q, engine.constant("b0"), engine.constant("c0"), w);
    engine.register_fact(
        engine.arrow(engine.flip(r), q),
        engine.constant("h"),
        engine.constant("k"),
        w,
    );

    let (left, right) = option_matches(&engine);
    let solution = engine.solve(&Goal::related(q, left, right));
    let proof = solution.proof().unwrap();
    assert!(proof.uses_rule("destruct"));
    assert!(proof.uses_rule("flip_intro"));
}

#[test]
fn missing_arm_fails_the_split() {
    let mut engine = Engine::new();
    let relators = Relators::install(&mut engine);
    let r = engine.constant("R");
    let q = engine.constant("Q");
    let w = engine.constant("w");
    let option_r = relators.option(&engine, r);
    engine.register_fact(option_r, engine.constant("s"), engine.constant("t"), w);
    engine.register_self_fact(q, engine.constant("b0"), w);

    let only_none = |scrutinee: &str| {
        engine.match_on(
            engine.constant(scrutinee),
            &[engine.arm("None", 0, engine.constant("b0"))],
        )
    };
    let solution = engine.solve(&Goal::related(q, only_none("s"), only_none("t")));
    assert!(solution.is_failed());
}

// ========== EQUALITY AND ALL PAIRS ==========

#[test]
fn equal_scrutinees_align_branches() {
    let mut engine = Engine::new();
    let q = engine.constant("Q");
    let w = engine.constant("w");
    engine.register_fact(q, engine.constant("b0"), engine.constant("c0"), w);
    engine.register_fact(
        engine.arrow(engine.eq(), q),
        engine.constant("h"),
        engine.constant("k"),
        w,
    );

    let same = |body_none: &str, body_some: &str| {
        engine.match_on(
            engine.constant("s"),
            &[
                engine.arm("None", 0, engine.constant(body_none)),
                engine.arm("Some", 1, engine.constant(body_some)),
            ],
        )
    };
    let goal = Goal::related(q, same("b0", "h"), same("c0", "k"));
    let solution = engine.solve(&goal);
    let proof = solution.proof().unwrap();
    assert!(proof.uses_rule("refl_placeholder"));
    assert_eq!(premise_count(proof), 3);
}

#[test]
fn unknown_scrutinee_relation_splits_all_pairs() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let q = engine.constant("Q");
    let c = engine.constant("c");
    let w = engine.constant("w");
    engine.register_fact(r, engine.constant("s"), engine.constant("t"), w);
    engine.register_self_fact(q, c, w);

    let both = |scrutinee: &str| {
        engine.match_on(
            engine.constant(scrutinee),
            &[engine.arm("A", 0, c), engine.arm("B", 0, c)],
        )
    };
    let solution = engine.solve(&Goal::related(q, both("s"), both("t")));
    let proof = solution.proof().unwrap();
    assert!(proof.uses_rule("destruct"));
    assert_eq!(premise_count(proof), 5);
}

#[test]
fn next_scrutinee_relation_is_tried_when_the_split_fails() {
    let mut engine = Engine::new();
    let relators = Relators::install(&mut engine);
    let r = engine.constant("R");
    let q = engine.constant("Q");
    let w = engine.constant("w");
    let (s, t) = (engine.constant("s"), engine.constant("t"));
    // Under plain `R` the split pairs every arm, and `Q b0 (k y)` fails.
    engine.register_fact(r, s, t, w);
    engine.register_fact(relators.option(&engine, r), s, t, w);
    engine.register_fact(q, engine.constant("b0"), engine.constant("c0"), w);
    engine.register_fact(
        engine.arrow(r, q),
        engine.constant("h"),
        engine.constant("k"),
        w,
    );

    let (left, right) = option_matches(&engine);
    let solution = engine.solve(&Goal::related(q, left, right));
    let proof = solution.proof().unwrap();
    assert!(proof.uses_rule("destruct"));
    assert_eq!(premise_count(proof), 3);
}

// ========== REDUCTION AND HELPERS ==========

#[test]
fn match_reduces_on_the_right() {
    let mut engine = Engine::new();
    let r = engine.constant("R");
    let a = engine.constant("a");
    let b = engine.constant("b");
    engine.register_fact(r, a, b, engine.constant("w"));

    let snd = engine.constant("snd");
    engine.register_fact(
        engine.arrow(engine.top(), engine.arrow(engine.top(), r)),
        snd,
        snd,
        engine.constant("w"),
    );

    let scrutinee = engine.app("pair", &[a, b]);
    let m = engine.match_on(scrutinee, &[engine.arm("pair", 2, snd)]);
    let applied = engine.app("snd", &[a, b]);

    let solution = engine.solve(&Goal::related(r, applied, m));
    let proof = solution.proof().unwrap();
    assert!(proof.uses_rule("match_reduce"));
    assert!(proof.uses_rule("mono_left"));

    // No arm for the scrutinee's constructor: nothing to reduce.
    let stuck = engine.match_on(scrutinee, &[engine.arm("other", 2, snd)]);
    assert!(engine.solve(&Goal::related(r, applied, stuck)).is_failed());
}

#[test]
fn arms_with_fields_apply_their_body() {
    let engine = Engine::new();
    let body = engine.constant("h");
    let x = engine.constant("x");
    assert_eq!(apply_arm(body, &[], engine.terms()), Some(body));
    assert_eq!(
        apply_arm(body, &[x], engine.terms()),
        Some(engine.app("h", &[x]))
    );
}

#[test]
fn field_relations_resolve_against_the_relator() {
    let engine = Engine::new();
    let r = engine.constant("R");
    let fixed = engine.constant("F");
    let whole = engine.named("list_rel", &[r]);

    assert_eq!(field_relation(FieldRel::Arg(0), whole, &[r]), Some(r));
    assert_eq!(field_relation(FieldRel::Arg(1), whole, &[r]), None);
    assert_eq!(field_relation(FieldRel::Fixed(fixed), whole, &[r]), Some(fixed));
    assert_eq!(field_relation(FieldRel::Recursive, whole, &[r]), Some(whole));
}

#[test]
fn scheme_lookup_by_left_constructor() {
    let engine = Engine::new();
    let (none, some) = (engine.sym("None"), engine.sym("Some"));
    let scheme = DestructScheme::new()
        .case(none, none, &[])
        .case(some, some, &[FieldRel::Arg(0)]);

    assert_eq!(scheme.for_left(some).map(|c| c.fields.len()), Some(1));
    assert_eq!(scheme.for_left(none).map(|c| c.right), Some(none));
    assert!(scheme.for_left(engine.sym("Other")).is_none());
}
