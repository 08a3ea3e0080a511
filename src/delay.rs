//! Deferred obligations.
//!
//! Rules may hand an obligation to the solve's [`DelayAccumulator`] instead
//! of proving it. While the solve runs the accumulator reads as an open
//! conjunction `g1 ∧ (g2 ∧ (.. ∧ ?))`; closing it replaces the trailing hole
//! with the unit, and [`reify`] turns the closed witness back into the
//! ordered list of obligations.

use crate::error::SolveError;
use crate::goal::Goal;
use crate::solver::Hypothesis;
use crate::subst::{apply_subst, Subst};
use crate::term::TermStore;

/// A deferred goal together with the hypotheses in scope when it was
/// deferred, so it can be discharged on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub goal: Goal,
    pub hypotheses: Vec<Hypothesis>,
}

/// Right-nested conjunction of deferred goals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conj {
    /// The empty conjunction.
    Unit,
    /// Still accepting deferrals.
    Open,
    And(Box<Pending>, Box<Conj>),
}

impl Conj {
    /// Number of conjuncts before the terminator.
    pub fn len(&self) -> usize {
        let mut n = 0;
        let mut cur = self;
        while let Conj::And(_, rest) = cur {
            n += 1;
            cur = rest;
        }
        n
    }

    pub fn is_empty(&self) -> bool {
        !matches!(self, Conj::And(..))
    }
}

/// Ordered list of deferred goals owned by one solve.
#[derive(Debug, Clone, Default)]
pub struct DelayAccumulator {
    pending: Vec<Pending>,
}

impl DelayAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an obligation; returns its position.
    pub fn defer(&mut self, pending: Pending) -> usize {
        self.pending.push(pending);
        self.pending.len() - 1
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forget deferrals made after position `len` (backtracking).
    pub fn truncate(&mut self, len: usize) {
        self.pending.truncate(len);
    }

    /// The accumulator as it stands, with an open tail.
    pub fn snapshot(&self) -> Conj {
        build(self.pending.iter().cloned(), Conj::Open)
    }

    /// Close the accumulator, instantiating each goal with the final
    /// bindings.
    pub fn close(self, subst: &Subst, terms: &TermStore) -> Conj {
        let resolved = self.pending.into_iter().map(|p| Pending {
            goal: p.goal.resolve(subst, terms),
            hypotheses: p
                .hypotheses
                .into_iter()
                .map(|h| Hypothesis {
                    rel: apply_subst(h.rel, subst, terms),
                    left: apply_subst(h.left, subst, terms),
                    right: apply_subst(h.right, subst, terms),
                    witness: h.witness,
                })
                .collect(),
        });
        build(resolved, Conj::Unit)
    }
}

fn build(items: impl DoubleEndedIterator<Item = Pending>, tail: Conj) -> Conj {
    items
        .rev()
        .fold(tail, |rest, p| Conj::And(Box::new(p), Box::new(rest)))
}

/// Recover the deferred obligations of a closed witness, in deferral order.
pub fn reify(witness: &Conj) -> Result<Vec<Pending>, SolveError> {
    let mut out = Vec::with_capacity(witness.len());
    let mut cur = witness;
    loop {
        match cur {
            Conj::Unit => return Ok(out),
            Conj::Open => return Err(SolveError::ImproperTerminator),
            Conj::And(pending, rest) => {
                out.push((**pending).clone());
                cur = rest;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/delay.rs"]
mod tests;
