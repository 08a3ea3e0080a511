//! relmono - a priority-ordered proof search engine for monotonicity
//! obligations over a relation algebra.
//!
//! Goals `R m n` are solved by step rules tried in priority order, with
//! backtracking over a trail-based substitution. Facts registered on the
//! [`Engine`] are found by prefix-based candidate selection, and obligations
//! a rule cannot settle may be deferred and handed back to the caller.

pub mod builtin;
pub mod candidate;
pub mod config;
pub mod delay;
pub mod destruct;
pub mod engine;
pub mod error;
pub mod facts;
pub mod goal;
pub mod metrics;
pub mod proof;
pub mod relation;
pub mod relators;
pub mod rules;
pub mod solver;
pub mod subst;
pub mod symbol;
pub mod term;
pub mod trace;
pub mod transport;
pub mod unify;

pub use config::SolverConfig;
pub use delay::{Conj, Pending};
pub use destruct::{DestructScheme, FieldRel};
pub use engine::Engine;
pub use error::SolveError;
pub use facts::Anchor;
pub use goal::{Goal, GoalPattern};
pub use metrics::SolveStats;
pub use proof::Proof;
pub use relation::{Relation, Shape, Variance};
pub use relators::Relators;
pub use rules::{priority, Emit, Reduction};
pub use solver::{Hypothesis, Solution, SolveOutcome, Solver};
pub use term::TermId;
pub use transport::{Computation, Transported};

#[cfg(test)]
pub(crate) mod test_utils;
