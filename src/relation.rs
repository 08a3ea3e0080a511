//! Relation algebra.
//!
//! Relations are ordinary terms whose head is one of the reserved symbols in
//! [`Vocab`]; everything else in relation position is a named relation or a
//! registered library relator. Keeping relations as terms lets placeholders
//! range over relations and terms alike. [`Relation`] is the typed view the
//! solver pattern-matches on.

use crate::subst::{walk, Subst};
use crate::symbol::{FuncId, SymbolStore};
use crate::term::{Term, TermId, TermStore};
use smallvec::SmallVec;

/// Reserved head symbols of the built-in combinators.
#[derive(Debug, Clone, Copy)]
pub struct Vocab {
    pub eq: FuncId,
    pub top: FuncId,
    pub bottom: FuncId,
    pub arrow: FuncId,
    pub forall: FuncId,
    pub flip: FuncId,
    pub const_family: FuncId,
}

impl Vocab {
    pub fn new(symbols: &SymbolStore) -> Self {
        Self {
            eq: symbols.intern("@eq"),
            top: symbols.intern("@top"),
            bottom: symbols.intern("@bottom"),
            arrow: symbols.intern("@arrow"),
            forall: symbols.intern("@forall"),
            flip: symbols.intern("@flip"),
            const_family: symbols.intern("@const"),
        }
    }

    pub fn is_reserved(&self, head: FuncId) -> bool {
        [
            self.eq,
            self.top,
            self.bottom,
            self.arrow,
            self.forall,
            self.flip,
            self.const_family,
        ]
        .contains(&head)
    }

    pub fn equality(&self, terms: &TermStore) -> TermId {
        terms.app0(self.eq)
    }

    pub fn top(&self, terms: &TermStore) -> TermId {
        terms.app0(self.top)
    }

    pub fn bottom(&self, terms: &TermStore) -> TermId {
        terms.app0(self.bottom)
    }

    pub fn arrow(&self, terms: &TermStore, dom: TermId, cod: TermId) -> TermId {
        terms.app2(self.arrow, dom, cod)
    }

    /// `DependentForall(edge, family)`.
    pub fn forall(&self, terms: &TermStore, edge: TermId, family: TermId) -> TermId {
        terms.app2(self.forall, edge, family)
    }

    pub fn flip(&self, terms: &TermStore, rel: TermId) -> TermId {
        terms.app1(self.flip, rel)
    }

    /// The family that ignores its indices and always yields `rel`.
    pub fn const_family(&self, terms: &TermStore, rel: TermId) -> TermId {
        terms.app1(self.const_family, rel)
    }
}

/// Variance of a combinator argument with respect to `Subrel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variance {
    Covariant,
    Contravariant,
    /// Arguments must agree exactly.
    Invariant,
}

/// Typed view of a term in relation position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    Equality,
    Top,
    Bottom,
    Arrow(TermId, TermId),
    Forall(TermId, TermId),
    Flip(TermId),
    /// A library relator or opaque named relation, possibly applied.
    Named(FuncId, SmallVec<[TermId; 4]>),
    /// An unbound placeholder.
    Placeholder(u32),
    /// A match expression in relation position; no rule applies to it.
    Opaque,
}

/// Shape tag of a relation, used by rule patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Equality,
    Top,
    Bottom,
    Arrow,
    Forall,
    Flip,
    Named(FuncId),
    Placeholder,
    Opaque,
}

impl Relation {
    /// View `rel` under `subst`. `Flip(Flip(r))` is seen as `r`.
    pub fn view(rel: TermId, subst: &Subst, vocab: &Vocab, terms: &TermStore) -> Relation {
        let mut rel = walk(rel, subst, terms);
        loop {
            let (head, args) = match terms.resolve(rel) {
                Some(Term::Var(idx)) => return Relation::Placeholder(idx),
                Some(Term::App(head, args)) => (head, args),
                _ => return Relation::Opaque,
            };
            let view = match (args.len(), head) {
                (0, h) if h == vocab.eq => Relation::Equality,
                (0, h) if h == vocab.top => Relation::Top,
                (0, h) if h == vocab.bottom => Relation::Bottom,
                (2, h) if h == vocab.arrow => Relation::Arrow(args[0], args[1]),
                (2, h) if h == vocab.forall => Relation::Forall(args[0], args[1]),
                (1, h) if h == vocab.flip => {
                    let inner = walk(args[0], subst, terms);
                    match terms.is_app(inner) {
                        Some((h2, inner_args)) if h2 == vocab.flip && inner_args.len() == 1 => {
                            rel = walk(inner_args[0], subst, terms);
                            continue;
                        }
                        _ => Relation::Flip(inner),
                    }
                }
                _ => Relation::Named(head, args),
            };
            return view;
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Relation::Equality => Shape::Equality,
            Relation::Top => Shape::Top,
            Relation::Bottom => Shape::Bottom,
            Relation::Arrow(..) => Shape::Arrow,
            Relation::Forall(..) => Shape::Forall,
            Relation::Flip(_) => Shape::Flip,
            Relation::Named(head, _) => Shape::Named(*head),
            Relation::Placeholder(_) => Shape::Placeholder,
            Relation::Opaque => Shape::Opaque,
        }
    }
}

/// Instantiate a relation family at indices `v1 v2` and edge witness `e`.
///
/// A constant family yields its relation; any other family application is
/// extended with the three indices. Placeholder families cannot be
/// instantiated.
pub fn instantiate_family(
    family: TermId,
    v1: TermId,
    v2: TermId,
    edge: TermId,
    subst: &Subst,
    vocab: &Vocab,
    terms: &TermStore,
) -> Option<TermId> {
    let family = walk(family, subst, terms);
    let (head, args) = terms.is_app(family)?;
    if head == vocab.const_family && args.len() == 1 {
        return Some(args[0]);
    }
    terms.apply(family, &[v1, v2, edge])
}

#[cfg(test)]
#[path = "tests/relation.rs"]
mod tests;
