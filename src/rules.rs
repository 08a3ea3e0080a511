//! Step rules and the priority-ordered rule table.

use crate::error::SolveError;
use crate::goal::{Goal, GoalPattern};
use crate::proof::Proof;
use crate::solver::Solver;
use std::fmt;
use std::sync::Arc;

/// Standard priority bands. Lower numbers are tried first.
pub mod priority {
    /// Syntax-directed unfolding of a combinator.
    pub const INTRO: i32 = 10;
    /// Reflexivity, transitivity and structural closure of `Subrel`.
    pub const ORDER: i32 = 20;
    /// Case analysis on related scrutinees.
    pub const DESTRUCT: i32 = 30;
    /// Candidate selection and elimination.
    pub const MONOTONICITY: i32 = 40;
    /// Rules that commit placeholders or give up on the goal.
    pub const LAST_RESORT: i32 = 50;
}

/// What a rule reduced its goal to.
///
/// `premises` are proofs the rule already built itself (for instance by
/// solving a subgoal inside a hypothesis scope); `subgoals` are handed back
/// to the solver, which proves them in order once the rule emits the
/// reduction.
#[derive(Debug, Default)]
pub struct Reduction {
    pub subgoals: Vec<Goal>,
    pub premises: Vec<Proof>,
}

impl Reduction {
    /// The goal holds outright.
    pub fn closed() -> Self {
        Self::default()
    }

    pub fn to(subgoals: Vec<Goal>) -> Self {
        Self {
            subgoals,
            premises: Vec::new(),
        }
    }

    pub fn with_premise(mut self, proof: Proof) -> Self {
        self.premises.push(proof);
        self
    }
}

/// Receives the reductions a branching rule proposes, one at a time. An
/// error means the reduction led nowhere and the rule should offer its next
/// alternative.
pub type Emit<'a, 'e> = dyn FnMut(&mut Solver<'e>, Reduction) -> Result<(), SolveError> + 'a;

/// Reduction function of a step rule. Returning an error means the rule does
/// not apply; the solver undoes whatever the rule bound and moves on.
pub type ReduceFn = dyn Fn(&mut Solver<'_>, &Goal) -> Result<Reduction, SolveError> + Send + Sync;

/// A rule with several ways of reducing its goal. It hands each one to the
/// emitter inside [`Solver::attempt`] and stops at the first that is
/// accepted.
pub type BranchFn = dyn for<'e, 'k> Fn(&mut Solver<'e>, &Goal, &mut Emit<'k, 'e>) -> Result<(), SolveError>
    + Send
    + Sync;

#[derive(Clone)]
enum Reducer {
    Single(Arc<ReduceFn>),
    Branching(Arc<BranchFn>),
}

#[derive(Clone)]
pub struct StepRule {
    pub name: Arc<str>,
    pub priority: i32,
    pub pattern: GoalPattern,
    reduce: Reducer,
}

impl StepRule {
    pub fn new<F>(name: &str, priority: i32, pattern: GoalPattern, reduce: F) -> Self
    where
        F: Fn(&mut Solver<'_>, &Goal) -> Result<Reduction, SolveError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            priority,
            pattern,
            reduce: Reducer::Single(Arc::new(reduce)),
        }
    }

    pub fn branching<F>(name: &str, priority: i32, pattern: GoalPattern, reduce: F) -> Self
    where
        F: for<'e, 'k> Fn(&mut Solver<'e>, &Goal, &mut Emit<'k, 'e>) -> Result<(), SolveError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: Arc::from(name),
            priority,
            pattern,
            reduce: Reducer::Branching(Arc::new(reduce)),
        }
    }

    /// Feed every reduction of `goal` to `emit` until one is accepted.
    pub fn reduce<'e>(
        &self,
        solver: &mut Solver<'e>,
        goal: &Goal,
        emit: &mut Emit<'_, 'e>,
    ) -> Result<(), SolveError> {
        match &self.reduce {
            Reducer::Single(f) => {
                let reduction = f(solver, goal)?;
                emit(solver, reduction)
            }
            Reducer::Branching(f) => f(solver, goal, emit),
        }
    }
}

impl fmt::Debug for StepRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("pattern", &self.pattern)
            .finish()
    }
}

/// Rules ordered by ascending priority; equal priorities keep registration
/// order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<StepRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: StepRule) {
        // Insert after every rule of lower or equal priority.
        let at = self.rules.partition_point(|r| r.priority <= rule.priority);
        self.rules.insert(at, rule);
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(name: &str, priority: i32) -> StepRule {
        StepRule::new(name, priority, GoalPattern::Any, |_, _| Ok(Reduction::closed()))
    }

    fn two_ways<'e>(solver: &mut Solver<'e>, _: &Goal, emit: &mut Emit<'_, 'e>) -> Result<(), SolveError> {
        let first = solver.attempt(|s| emit(s, Reduction::closed()));
        first.or_else(|_| emit(solver, Reduction::closed()))
    }

    #[test]
    fn rules_sorted_by_priority_then_registration() {
        let mut set = RuleSet::new();
        set.register(dummy("late", 50));
        set.register(dummy("first", 10));
        set.register(dummy("second", 10));
        set.register(dummy("middle", 20));

        let names: Vec<&str> = set.iter().map(|r| &*r.name).collect();
        assert_eq!(names, vec!["first", "second", "middle", "late"]);
    }

    #[test]
    fn branching_rule_offers_its_next_reduction() {
        let engine = crate::engine::Engine::new();
        let a = engine.constant("a");
        let goal = Goal::related(engine.eq(), a, a);
        let rule = StepRule::branching("two_ways", 1, GoalPattern::Any, two_ways);

        crate::test_utils::with_solver(&engine, &goal, |s| {
            let mut offered = 0;
            let result = rule.reduce(s, &goal, &mut |_, _| {
                offered += 1;
                if offered == 1 {
                    Err(SolveError::ImproperTerminator)
                } else {
                    Ok(())
                }
            });
            assert!(result.is_ok());
            assert_eq!(offered, 2);
        });
    }
}
