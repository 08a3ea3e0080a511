use crate::facts::{FactId, SubrelId};
use crate::term::TermId;
use std::sync::Arc;

/// Witness tree built by the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proof {
    /// A registered fact, with its (renamed) witness term.
    Fact { id: FactId, witness: TermId },
    /// A registered subrel fact.
    Subrel(SubrelId),
    /// A local hypothesis introduced by an intro rule.
    Hypothesis(TermId),
    /// The obligation was deferred; the index is its position in the
    /// solve's delay witness.
    Deferred(usize),
    /// A step rule application.
    Step { rule: Arc<str>, premises: Vec<Proof> },
}

impl Proof {
    pub fn step(rule: &Arc<str>, premises: Vec<Proof>) -> Self {
        Proof::Step {
            rule: Arc::clone(rule),
            premises,
        }
    }

    /// The term naming this proof when it is used as a family index, if it
    /// has one. A step with a single premise is named by that premise.
    pub fn witness_term(&self) -> Option<TermId> {
        match self {
            Proof::Fact { witness, .. } | Proof::Hypothesis(witness) => Some(*witness),
            Proof::Step { premises, .. } if premises.len() == 1 => premises[0].witness_term(),
            _ => None,
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Proof::Step { premises, .. } => 1 + premises.iter().map(Proof::size).sum::<usize>(),
            _ => 1,
        }
    }

    /// Whether the rule named `rule` was used anywhere in the tree.
    pub fn uses_rule(&self, rule: &str) -> bool {
        match self {
            Proof::Step { rule: r, premises } => {
                &**r == rule || premises.iter().any(|p| p.uses_rule(rule))
            }
            _ => false,
        }
    }

    /// Delay indices referenced by the tree, in tree order.
    pub fn deferred(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(p) = stack.pop() {
            match p {
                Proof::Deferred(idx) => out.push(*idx),
                Proof::Step { premises, .. } => stack.extend(premises.iter().rev()),
                _ => {}
            }
        }
        out
    }
}
