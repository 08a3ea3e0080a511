use crate::relation::{Relation, Shape, Vocab};
use crate::subst::{apply_subst, walk, Subst};
use crate::symbol::SymbolStore;
use crate::term::{format_term, TermId, TermStore};

/// A proof obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Goal {
    /// `rel left right`.
    Related {
        rel: TermId,
        left: TermId,
        right: TermId,
    },
    /// Every pair related by `lesser` is related by `greater`.
    Subrel { lesser: TermId, greater: TermId },
}

impl Goal {
    pub fn related(rel: TermId, left: TermId, right: TermId) -> Self {
        Goal::Related { rel, left, right }
    }

    pub fn subrel(lesser: TermId, greater: TermId) -> Self {
        Goal::Subrel { lesser, greater }
    }

    /// The goal with every bound placeholder substituted.
    pub fn resolve(&self, subst: &Subst, terms: &TermStore) -> Goal {
        match *self {
            Goal::Related { rel, left, right } => Goal::Related {
                rel: apply_subst(rel, subst, terms),
                left: apply_subst(left, subst, terms),
                right: apply_subst(right, subst, terms),
            },
            Goal::Subrel { lesser, greater } => Goal::Subrel {
                lesser: apply_subst(lesser, subst, terms),
                greater: apply_subst(greater, subst, terms),
            },
        }
    }

    /// Largest placeholder index mentioned by the goal.
    pub fn max_var(&self, terms: &TermStore) -> Option<u32> {
        match *self {
            Goal::Related { rel, left, right } => terms
                .max_var(rel)
                .max(terms.max_var(left))
                .max(terms.max_var(right)),
            Goal::Subrel { lesser, greater } => terms.max_var(lesser).max(terms.max_var(greater)),
        }
    }
}

/// Syntactic shape a step rule is willing to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalPattern {
    /// Every goal.
    Any,
    /// Related goals whose relation has the given shape.
    Related(Shape),
    /// Related goals of any relation.
    AnyRelated,
    /// Related goals whose two sides are both match expressions.
    MatchBoth,
    /// Subrel goals.
    Subrel,
}

impl GoalPattern {
    pub fn matches(&self, goal: &Goal, subst: &Subst, vocab: &Vocab, terms: &TermStore) -> bool {
        match (self, goal) {
            (GoalPattern::Any, _) => true,
            (GoalPattern::Subrel, Goal::Subrel { .. }) => true,
            (GoalPattern::AnyRelated, Goal::Related { .. }) => true,
            (GoalPattern::Related(shape), Goal::Related { rel, .. }) => {
                Relation::view(*rel, subst, vocab, terms).shape() == *shape
            }
            (GoalPattern::MatchBoth, Goal::Related { left, right, .. }) => {
                let left = walk(*left, subst, terms);
                let right = walk(*right, subst, terms);
                terms.is_match(left).is_some() && terms.is_match(right).is_some()
            }
            _ => false,
        }
    }
}

/// Render a goal as `(rel left right)` or `(subrel lesser greater)`.
pub fn format_goal(goal: &Goal, terms: &TermStore, symbols: &SymbolStore) -> Result<String, String> {
    match *goal {
        Goal::Related { rel, left, right } => Ok(format!(
            "{} {} {}",
            format_term(rel, terms, symbols)?,
            format_term(left, terms, symbols)?,
            format_term(right, terms, symbols)?
        )),
        Goal::Subrel { lesser, greater } => Ok(format!(
            "subrel {} {}",
            format_term(lesser, terms, symbols)?,
            format_term(greater, terms, symbols)?
        )),
    }
}

#[cfg(test)]
#[path = "tests/goal.rs"]
mod tests;
