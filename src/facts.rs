//! Registries of relational facts, subrel facts and the per-symbol metadata
//! the solver consults. Populated through `&mut Engine` before solving and
//! read-only afterwards.

use crate::destruct::DestructScheme;
use crate::relation::Variance;
use crate::symbol::FuncId;
use crate::term::{TermId, TermStore};
use hashbrown::HashMap;
use smallvec::SmallVec;

pub type FactId = usize;
pub type SubrelId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactKind {
    /// Left and right may differ.
    Related,
    /// The term is an element of the relation.
    SelfFact,
}

/// Which side of a goal a candidate is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Left,
    Right,
}

impl Anchor {
    fn slot(self) -> usize {
        match self {
            Anchor::Left => 0,
            Anchor::Right => 1,
        }
    }
}

/// A registered witness that `rel left right` holds.
///
/// Placeholders below `schematic` are universally quantified and renamed
/// apart each time the fact is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fact {
    pub rel: TermId,
    pub left: TermId,
    pub right: TermId,
    pub witness: TermId,
    pub kind: FactKind,
    pub schematic: u32,
}

impl Fact {
    pub fn side(&self, anchor: Anchor) -> TermId {
        match anchor {
            Anchor::Left => self.left,
            Anchor::Right => self.right,
        }
    }
}

/// A registered `lesser ⊆ greater` fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubrelFact {
    pub lesser: TermId,
    pub greater: TermId,
    pub witness: TermId,
    pub schematic: u32,
}

type Bucket = SmallVec<[FactId; 4]>;

#[derive(Debug, Default)]
struct FactIndex {
    /// Keyed by head symbol and argument count of the anchored side.
    by_shape: [HashMap<(FuncId, usize), Bucket>; 2],
    /// Keyed by head symbol of the anchored side.
    by_head: [HashMap<FuncId, Bucket>; 2],
}

impl FactIndex {
    fn insert(&mut self, id: FactId, anchor: Anchor, side: TermId, terms: &TermStore) {
        if let Some((head, args)) = terms.is_app(side) {
            let slot = anchor.slot();
            self.by_shape[slot].entry((head, args.len())).or_default().push(id);
            self.by_head[slot].entry(head).or_default().push(id);
        }
    }
}

#[derive(Debug, Default)]
pub struct FactRegistry {
    facts: Vec<Fact>,
    related: FactIndex,
    selves: FactIndex,
    subrels: Vec<SubrelFact>,
    param_counts: HashMap<FuncId, usize>,
    combinators: HashMap<FuncId, SmallVec<[Variance; 4]>>,
    schemes: HashMap<FuncId, DestructScheme>,
    computations: HashMap<TermId, TermId>,
}

fn schematic_count(terms: &TermStore, ids: &[TermId]) -> u32 {
    ids.iter()
        .filter_map(|t| terms.max_var(*t))
        .max()
        .map_or(0, |m| m + 1)
}

impl FactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_fact(
        &mut self,
        terms: &TermStore,
        rel: TermId,
        left: TermId,
        right: TermId,
        witness: TermId,
    ) -> FactId {
        let id = self.facts.len();
        self.facts.push(Fact {
            rel,
            left,
            right,
            witness,
            kind: FactKind::Related,
            schematic: schematic_count(terms, &[rel, left, right, witness]),
        });
        self.related.insert(id, Anchor::Left, left, terms);
        self.related.insert(id, Anchor::Right, right, terms);
        id
    }

    pub fn add_self_fact(
        &mut self,
        terms: &TermStore,
        rel: TermId,
        term: TermId,
        witness: TermId,
    ) -> FactId {
        let id = self.facts.len();
        self.facts.push(Fact {
            rel,
            left: term,
            right: term,
            witness,
            kind: FactKind::SelfFact,
            schematic: schematic_count(terms, &[rel, term, witness]),
        });
        self.selves.insert(id, Anchor::Left, term, terms);
        self.selves.insert(id, Anchor::Right, term, terms);
        id
    }

    pub fn add_subrel(
        &mut self,
        terms: &TermStore,
        lesser: TermId,
        greater: TermId,
        witness: TermId,
    ) -> SubrelId {
        self.subrels.push(SubrelFact {
            lesser,
            greater,
            witness,
            schematic: schematic_count(terms, &[lesser, greater, witness]),
        });
        self.subrels.len() - 1
    }

    pub fn set_parameter_count(&mut self, head: FuncId, count: usize) {
        self.param_counts.insert(head, count);
    }

    pub fn set_combinator(&mut self, head: FuncId, variances: SmallVec<[Variance; 4]>) {
        self.combinators.insert(head, variances);
    }

    pub fn set_scheme(&mut self, head: FuncId, scheme: DestructScheme) {
        self.schemes.insert(head, scheme);
    }

    pub fn add_computation(&mut self, term: TermId, value: TermId) {
        self.computations.insert(term, value);
    }

    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(id)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn subrel(&self, id: SubrelId) -> Option<&SubrelFact> {
        self.subrels.get(id)
    }

    pub fn subrels(&self) -> impl Iterator<Item = (SubrelId, &SubrelFact)> {
        self.subrels.iter().enumerate()
    }

    pub fn parameter_count(&self, head: FuncId) -> Option<usize> {
        self.param_counts.get(&head).copied()
    }

    pub fn variances(&self, head: FuncId) -> Option<&[Variance]> {
        self.combinators.get(&head).map(|v| v.as_slice())
    }

    pub fn scheme(&self, head: FuncId) -> Option<&DestructScheme> {
        self.schemes.get(&head)
    }

    pub fn computation(&self, term: TermId) -> Option<TermId> {
        self.computations.get(&term).copied()
    }

    /// Facts whose anchored side is `head` applied to exactly `arity`
    /// arguments: related facts first, then self-facts, each in
    /// registration order.
    pub fn by_shape(&self, anchor: Anchor, head: FuncId, arity: usize) -> Vec<FactId> {
        let slot = anchor.slot();
        let key = (head, arity);
        [&self.related, &self.selves]
            .iter()
            .filter_map(|index| index.by_shape[slot].get(&key))
            .flat_map(|bucket| bucket.iter().copied())
            .collect()
    }

    /// Facts whose anchored side has head `head`, any arity.
    pub fn by_head(&self, anchor: Anchor, head: FuncId) -> Vec<FactId> {
        let slot = anchor.slot();
        [&self.related, &self.selves]
            .iter()
            .filter_map(|index| index.by_head[slot].get(&head))
            .flat_map(|bucket| bucket.iter().copied())
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/facts.rs"]
mod tests;
