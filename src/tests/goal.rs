use super::*;
use crate::test_utils::setup;

#[test]
fn resolve_substitutes_every_position() {
    let (symbols, terms) = setup();
    let a = terms.app0(symbols.intern("a"));
    let mut subst = Subst::new();
    subst.bind(0, a);
    subst.bind(1, a);

    let goal = Goal::related(terms.var(0), terms.var(1), terms.var(2));
    assert_eq!(goal.resolve(&subst, &terms), Goal::related(a, a, terms.var(2)));

    let sub = Goal::subrel(terms.var(0), terms.var(2));
    assert_eq!(sub.resolve(&subst, &terms), Goal::subrel(a, terms.var(2)));
}

#[test]
fn max_var_spans_all_sides() {
    let (symbols, terms) = setup();
    let f = symbols.intern("f");
    let goal = Goal::related(terms.var(1), terms.app1(f, terms.var(5)), terms.var(0));
    assert_eq!(goal.max_var(&terms), Some(5));

    let ground = Goal::subrel(terms.app0(f), terms.app0(f));
    assert_eq!(ground.max_var(&terms), None);
}

#[test]
fn patterns_select_by_shape() {
    let (symbols, terms) = setup();
    let vocab = Vocab::new(&symbols);
    let subst = Subst::new();
    let a = terms.app0(symbols.intern("a"));
    let arrow = vocab.arrow(&terms, a, a);

    let related = Goal::related(arrow, a, a);
    let sub = Goal::subrel(a, a);

    assert!(GoalPattern::Any.matches(&sub, &subst, &vocab, &terms));
    assert!(GoalPattern::Related(Shape::Arrow).matches(&related, &subst, &vocab, &terms));
    assert!(!GoalPattern::Related(Shape::Flip).matches(&related, &subst, &vocab, &terms));
    assert!(GoalPattern::AnyRelated.matches(&related, &subst, &vocab, &terms));
    assert!(!GoalPattern::AnyRelated.matches(&sub, &subst, &vocab, &terms));
    assert!(GoalPattern::Subrel.matches(&sub, &subst, &vocab, &terms));
    assert!(!GoalPattern::MatchBoth.matches(&related, &subst, &vocab, &terms));
}

#[test]
fn match_both_sees_through_bindings() {
    let (symbols, terms) = setup();
    let vocab = Vocab::new(&symbols);
    let none = symbols.intern("None");
    let a = terms.app0(symbols.intern("a"));
    let m = terms.match_on(
        a,
        smallvec::smallvec![crate::term::MatchArm {
            ctor: none,
            arity: 0,
            body: a
        }],
    );
    let mut subst = Subst::new();
    subst.bind(0, m);

    let goal = Goal::related(vocab.equality(&terms), terms.var(0), m);
    assert!(GoalPattern::MatchBoth.matches(&goal, &subst, &vocab, &terms));
}

#[test]
fn format_goal_renders_both_kinds() {
    let (symbols, terms) = setup();
    let r = terms.app0(symbols.intern("R"));
    let a = terms.app0(symbols.intern("a"));

    let related = Goal::related(r, a, terms.var(0));
    assert_eq!(format_goal(&related, &terms, &symbols).unwrap(), "R a ?0");
    let sub = Goal::subrel(r, r);
    assert_eq!(format_goal(&sub, &terms, &symbols).unwrap(), "subrel R R");
}
