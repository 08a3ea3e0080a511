use super::*;
use crate::test_utils::setup;

// ========== BINDING ==========

#[test]
fn new_subst_is_empty() {
    let subst = Subst::new();
    assert!(subst.is_empty());
    assert_eq!(subst.len(), 0);
    assert_eq!(subst.get(0), None);
}

#[test]
fn bind_extends_automatically() {
    let (_, terms) = setup();
    let t = terms.var(99);

    let mut subst = Subst::new();
    subst.bind(100, t);

    assert_eq!(subst.get(100), Some(t));
    assert!(subst.is_bound(100));
    assert!(!subst.is_bound(99));
    assert_eq!(subst.len(), 1);
}

#[test]
fn iter_follows_binding_order() {
    let (symbols, terms) = setup();
    let a = terms.app0(symbols.intern("a"));
    let b = terms.app0(symbols.intern("b"));

    let mut subst = Subst::new();
    subst.bind(5, a);
    subst.bind(1, b);

    assert_eq!(subst.iter().collect::<Vec<_>>(), vec![(5, a), (1, b)]);
}

// ========== CHECKPOINT / ROLLBACK ==========

#[test]
fn rollback_undoes_later_bindings_only() {
    let (symbols, terms) = setup();
    let a = terms.app0(symbols.intern("a"));
    let b = terms.app0(symbols.intern("b"));

    let mut subst = Subst::new();
    subst.bind(0, a);
    let mark = subst.checkpoint();
    subst.bind(1, b);
    subst.bind(2, a);
    subst.rollback(mark);

    assert_eq!(subst.get(0), Some(a));
    assert_eq!(subst.get(1), None);
    assert_eq!(subst.get(2), None);
    assert_eq!(subst.len(), 1);
}

#[test]
fn rollback_allows_rebinding() {
    let (symbols, terms) = setup();
    let a = terms.app0(symbols.intern("a"));
    let b = terms.app0(symbols.intern("b"));

    let mut subst = Subst::new();
    let mark = subst.checkpoint();
    subst.bind(0, a);
    subst.rollback(mark);
    subst.bind(0, b);

    assert_eq!(subst.get(0), Some(b));
}

// ========== WALK / APPLY ==========

#[test]
fn walk_follows_chains() {
    let (symbols, terms) = setup();
    let a = terms.app0(symbols.intern("a"));

    let mut subst = Subst::new();
    subst.bind(2, terms.var(1));
    subst.bind(1, a);

    assert_eq!(walk(terms.var(2), &subst, &terms), a);
    assert_eq!(walk(terms.var(3), &subst, &terms), terms.var(3));
}

#[test]
fn apply_subst_rebuilds_nested_terms() {
    let (symbols, terms) = setup();
    let f = symbols.intern("f");
    let a = terms.app0(symbols.intern("a"));
    let t = terms.app2(f, terms.var(0), terms.app1(f, terms.var(1)));

    let mut subst = Subst::new();
    subst.bind(1, a);

    let expected = terms.app2(f, terms.var(0), terms.app1(f, a));
    assert_eq!(apply_subst(t, &subst, &terms), expected);
}

#[test]
fn apply_subst_reaches_match_arms() {
    let (symbols, terms) = setup();
    let some = symbols.intern("Some");
    let a = terms.app0(symbols.intern("a"));
    let arm = |body| MatchArm {
        ctor: some,
        arity: 1,
        body,
    };
    let m = terms.match_on(terms.var(0), smallvec::smallvec![arm(terms.var(1))]);

    let mut subst = Subst::new();
    subst.bind(0, a);
    subst.bind(1, a);

    let expected = terms.match_on(a, smallvec::smallvec![arm(a)]);
    assert_eq!(apply_subst(m, &subst, &terms), expected);
}
