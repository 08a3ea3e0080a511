//! The priority-ordered step solver.
//!
//! A [`Solver`] is the mutable context of one top-level solve: the
//! substitution with its undo trail, the local hypotheses introduced by
//! intro rules, the delay accumulator and the statistics. Rules receive it
//! mutably and may call back into [`Solver::solve_goal`] for subgoals that
//! must be proved in a particular scope.
//!
//! Search is written in continuation-passing style. Proving a goal hands
//! each of its proofs, one at a time, to a continuation that carries on with
//! the rest of the search. When the continuation fails the goal undoes its
//! bindings and offers its next proof: the next alternative of the current
//! rule, then the rules after it in priority order. A sibling subgoal that
//! cannot be proved therefore sends the search back into the subgoals before
//! it.

use crate::config::SolverConfig;
use crate::delay::{Conj, DelayAccumulator, Pending};
use crate::engine::Engine;
use crate::error::SolveError;
use crate::facts::FactRegistry;
use crate::goal::{format_goal, Goal};
use crate::metrics::SolveStats;
use crate::proof::Proof;
use crate::relation::{Relation, Vocab};
use crate::rules::Reduction;
use crate::subst::{apply_subst, walk, Checkpoint, Subst};
use crate::symbol::SymbolStore;
use crate::term::{TermId, TermStore};
use crate::unify::unify;
use smallvec::SmallVec;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::trace::{debug, debug_span, trace};

/// A local assumption `rel left right` named by `witness`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hypothesis {
    pub rel: TermId,
    pub left: TermId,
    pub right: TermId,
    pub witness: TermId,
}

/// Receives each proof of a goal. Returning an error rejects the proof and
/// asks the goal for its next one.
pub type Cont<'a, 'e> = dyn FnMut(&mut Solver<'e>, Proof) -> Result<(), SolveError> + 'a;

/// Receives the proofs of a list of goals, in order.
pub type SeqCont<'a, 'e> = dyn FnMut(&mut Solver<'e>, Vec<Proof>) -> Result<(), SolveError> + 'a;

/// How a top-level solve ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Fully proved.
    Solved(Proof),
    /// Proved modulo the obligations packed in `witness`; see
    /// [`crate::delay::reify`].
    Deferred { proof: Proof, witness: Conj },
    /// Every alternative failed; carries the most specific error seen.
    Failed(SolveError),
}

/// Result of [`Engine::solve`].
#[derive(Debug, Clone)]
pub struct Solution {
    /// The goal with the final bindings applied.
    pub goal: Goal,
    pub outcome: SolveOutcome,
    /// Final values of the placeholders that appeared in the goal.
    pub bindings: Vec<(u32, TermId)>,
    pub stats: SolveStats,
}

impl Solution {
    pub fn is_solved(&self) -> bool {
        matches!(self.outcome, SolveOutcome::Solved(_))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.outcome, SolveOutcome::Deferred { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SolveOutcome::Failed(_))
    }

    /// Proved, possibly modulo deferred obligations.
    pub fn holds(&self) -> bool {
        !self.is_failed()
    }

    pub fn proof(&self) -> Option<&Proof> {
        match &self.outcome {
            SolveOutcome::Solved(proof) | SolveOutcome::Deferred { proof, .. } => Some(proof),
            SolveOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SolveError> {
        match &self.outcome {
            SolveOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn witness(&self) -> Option<&Conj> {
        match &self.outcome {
            SolveOutcome::Deferred { witness, .. } => Some(witness),
            _ => None,
        }
    }

    /// Final value of placeholder `var` from the goal.
    pub fn binding(&self, var: u32) -> Option<TermId> {
        self.bindings.iter().find(|(v, _)| *v == var).map(|(_, t)| *t)
    }
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    subst: Checkpoint,
    hypotheses: usize,
    delayed: usize,
}

pub struct Solver<'e> {
    engine: &'e Engine,
    subst: Subst,
    hypotheses: Vec<Hypothesis>,
    delay: DelayAccumulator,
    /// Goals currently being proved, innermost last.
    active: Vec<Goal>,
    /// Placeholders below this index belong to the caller's goal.
    first_own_var: u32,
    next_var: u32,
    depth: usize,
    stats: SolveStats,
}

impl<'e> Solver<'e> {
    /// A fresh context whose own placeholders start after `first_free_var`.
    pub(crate) fn new(engine: &'e Engine, first_free_var: u32) -> Self {
        Self {
            engine,
            subst: Subst::new(),
            hypotheses: Vec::new(),
            delay: DelayAccumulator::new(),
            active: Vec::new(),
            first_own_var: first_free_var,
            next_var: first_free_var,
            depth: 0,
            stats: SolveStats::default(),
        }
    }

    pub fn terms(&self) -> &'e TermStore {
        &self.engine.terms
    }

    pub fn symbols(&self) -> &'e SymbolStore {
        &self.engine.symbols
    }

    pub fn vocab(&self) -> &'e Vocab {
        &self.engine.vocab
    }

    pub fn facts(&self) -> &'e FactRegistry {
        &self.engine.facts
    }

    pub fn config(&self) -> &'e SolverConfig {
        &self.engine.config
    }

    pub fn subst(&self) -> &Subst {
        &self.subst
    }

    /// Hypotheses in scope, outermost first.
    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut SolveStats {
        &mut self.stats
    }

    /// Dereference a placeholder chain.
    pub fn walk(&self, term: TermId) -> TermId {
        walk(term, &self.subst, self.terms())
    }

    /// Apply every current binding.
    pub fn resolve(&self, term: TermId) -> TermId {
        apply_subst(term, &self.subst, self.terms())
    }

    pub fn view(&self, rel: TermId) -> Relation {
        Relation::view(rel, &self.subst, self.vocab(), self.terms())
    }

    /// Unify two terms; on failure nothing is bound.
    pub fn unify(&mut self, a: TermId, b: TermId) -> bool {
        self.stats.unifications += 1;
        unify(a, b, &mut self.subst, self.engine.terms())
    }

    /// A new unbound placeholder.
    pub fn fresh_var(&mut self) -> TermId {
        let idx = self.next_var;
        self.next_var += 1;
        self.terms().var(idx)
    }

    /// Reserve `count` consecutive placeholder indices, returning the first.
    /// Used to rename schematic facts apart.
    pub fn reserve_vars(&mut self, count: u32) -> u32 {
        let first = self.next_var;
        self.next_var += count;
        first
    }

    /// A new rigid constant.
    pub fn fresh_constant(&self, hint: &str) -> TermId {
        self.terms().app0(self.symbols().fresh(hint))
    }

    pub fn fresh_constants(&self, hint: &str, count: usize) -> SmallVec<[TermId; 4]> {
        (0..count).map(|_| self.fresh_constant(hint)).collect()
    }

    /// Run `f` with extra hypotheses in scope.
    pub fn with_hypotheses<T>(
        &mut self,
        hypotheses: impl IntoIterator<Item = Hypothesis>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let outer = self.hypotheses.len();
        self.hypotheses.extend(hypotheses);
        let result = f(self);
        self.hypotheses.truncate(outer);
        result
    }

    /// Prove `goal` with extra hypotheses in scope. They are withdrawn while
    /// `k` runs and restored if it asks for another proof.
    pub fn solve_assuming(
        &mut self,
        hypotheses: impl IntoIterator<Item = Hypothesis>,
        goal: &Goal,
        k: &mut Cont<'_, 'e>,
    ) -> Result<(), SolveError> {
        let outer = self.hypotheses.len();
        self.with_hypotheses(hypotheses, |s| {
            s.solve_goal(goal, &mut |s: &mut Solver<'e>, proof: Proof| {
                let scoped = s.hypotheses.split_off(outer);
                let result = k(s, proof);
                s.hypotheses.truncate(outer);
                s.hypotheses.extend(scoped);
                result
            })
        })
    }

    /// Hand `goal` to the delay accumulator instead of proving it.
    pub fn defer(&mut self, goal: &Goal) -> Proof {
        let goal = goal.resolve(&self.subst, self.terms());
        #[cfg(feature = "tracing")]
        debug!(goal = %self.describe(&goal), "defer");
        self.stats.deferrals += 1;
        let idx = self.delay.defer(Pending {
            goal,
            hypotheses: self.hypotheses.clone(),
        });
        Proof::Deferred(idx)
    }

    /// The accumulator as it currently stands, with an open tail.
    pub fn delayed(&self) -> Conj {
        self.delay.snapshot()
    }

    /// Human-readable rendering of a goal for error messages.
    pub fn describe(&self, goal: &Goal) -> String {
        let goal = goal.resolve(&self.subst, self.terms());
        format_goal(&goal, self.terms(), self.symbols()).unwrap_or_else(|e| e)
    }

    pub fn no_rule(&self, goal: &Goal) -> SolveError {
        SolveError::NoMatchingRule(self.describe(goal))
    }

    fn exhausted(&self) -> SolveError {
        SolveError::DepthExceeded {
            depth: self.depth,
            steps: self.stats.steps,
        }
    }

    pub(crate) fn out_of_fuel(&self) -> bool {
        self.stats.steps >= self.config().fuel
    }

    fn mark(&self) -> Mark {
        Mark {
            subst: self.subst.checkpoint(),
            hypotheses: self.hypotheses.len(),
            delayed: self.delay.len(),
        }
    }

    fn undo(&mut self, mark: Mark) {
        self.subst.rollback(mark.subst);
        self.hypotheses.truncate(mark.hypotheses);
        self.delay.truncate(mark.delayed);
    }

    /// Run `f`, undoing its bindings, hypotheses and deferrals if it fails.
    pub fn attempt<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, SolveError>,
    ) -> Result<T, SolveError> {
        let mark = self.mark();
        let result = f(self);
        if result.is_err() {
            self.undo(mark);
        }
        result
    }

    /// Prove `goal`, trying every matching rule in priority order, and pass
    /// each proof to `k` until `k` accepts one.
    pub fn solve_goal(&mut self, goal: &Goal, k: &mut Cont<'_, 'e>) -> Result<(), SolveError> {
        if self.depth >= self.config().max_depth || self.out_of_fuel() {
            return Err(self.exhausted());
        }
        let goal = goal.resolve(&self.subst, self.terms());
        if self.active.contains(&goal) {
            return Err(SolveError::NoMatchingRule(format!(
                "{} (already being proved)",
                self.describe(&goal)
            )));
        }

        self.enter(goal);
        #[cfg(feature = "tracing")]
        let _span = debug_span!("solve_goal", depth = self.depth, goal = %self.describe(&goal))
            .entered();

        // The goal is no longer in progress while the rest of the search runs.
        let result = self.try_rules(&goal, &mut |s: &mut Solver<'e>, proof: Proof| {
            s.leave();
            let result = k(s, proof);
            s.enter(goal);
            result
        });

        self.leave();
        result
    }

    /// Prove goals left to right, passing their proofs to `k`. A goal that
    /// cannot be proved makes the one before it produce its next proof.
    fn solve_seq(
        &mut self,
        goals: &[Goal],
        done: Vec<Proof>,
        k: &mut SeqCont<'_, 'e>,
    ) -> Result<(), SolveError> {
        let Some((first, rest)) = goals.split_first() else {
            return k(self, done);
        };
        self.solve_goal(first, &mut |s: &mut Solver<'e>, proof: Proof| {
            let mut done = done.clone();
            done.push(proof);
            s.solve_seq(rest, done, &mut *k)
        })
    }

    /// Prove `goal` and keep its first complete proof.
    pub fn prove(&mut self, goal: &Goal) -> Result<Proof, SolveError> {
        let mut found = None;
        self.solve_goal(goal, &mut |_, proof| {
            found = Some(proof);
            Ok(())
        })?;
        found.ok_or_else(|| self.no_rule(goal))
    }

    fn enter(&mut self, goal: Goal) {
        self.depth += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.depth);
        self.active.push(goal);
    }

    fn leave(&mut self) {
        self.active.pop();
        self.depth -= 1;
    }

    fn try_rules(&mut self, goal: &Goal, k: &mut Cont<'_, 'e>) -> Result<(), SolveError> {
        let engine = self.engine;
        let mut best: Option<SolveError> = None;

        for rule in engine.rules.iter() {
            if !rule
                .pattern
                .matches(goal, &self.subst, &engine.vocab, &engine.terms)
            {
                continue;
            }
            if self.out_of_fuel() {
                return Err(self.exhausted());
            }
            self.stats.steps += 1;

            let mark = self.mark();
            let result = rule.reduce(self, goal, &mut |s: &mut Solver<'e>, reduction: Reduction| {
                s.expand(&rule.name, reduction, &mut *k)
            });
            match result {
                Ok(()) => {
                    #[cfg(feature = "tracing")]
                    trace!(rule = %rule.name, "rule_succeeded");
                    return Ok(());
                }
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    trace!(rule = %rule.name, error = %err, "rule_failed");
                    self.undo(mark);
                    self.stats.backtracks += 1;
                    if self.out_of_fuel() {
                        return Err(err);
                    }
                    best = Some(err.most_specific(best));
                }
            }
        }

        Err(best.unwrap_or_else(|| self.no_rule(goal)))
    }

    /// Prove a reduction's subgoals and hand the assembled step to `k`.
    fn expand(&mut self, rule: &Arc<str>, reduction: Reduction, k: &mut Cont<'_, 'e>) -> Result<(), SolveError> {
        let Reduction { subgoals, premises } = reduction;
        self.solve_seq(&subgoals, premises, &mut |s: &mut Solver<'e>, premises: Vec<Proof>| {
            k(s, Proof::step(rule, premises))
        })
    }

    /// Package the final state of a top-level solve.
    pub(crate) fn finish(self, goal: &Goal, result: Result<Proof, SolveError>) -> Solution {
        let terms = self.engine.terms();
        let instantiated = goal.resolve(&self.subst, terms);
        let bindings = (0..self.first_own_var)
            .filter(|v| self.subst.is_bound(*v))
            .map(|v| (v, apply_subst(terms.var(v), &self.subst, terms)))
            .collect();

        #[cfg(feature = "tracing")]
        debug!(
            steps = self.stats.steps,
            backtracks = self.stats.backtracks,
            deferrals = self.delay.len(),
            ok = result.is_ok(),
            "solve_finished"
        );

        let outcome = match result {
            Ok(proof) if self.delay.is_empty() => SolveOutcome::Solved(proof),
            Ok(proof) => SolveOutcome::Deferred {
                proof,
                witness: self.delay.close(&self.subst, terms),
            },
            Err(err) => SolveOutcome::Failed(err),
        };

        Solution {
            goal: instantiated,
            outcome,
            bindings,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
#[path = "tests/solver.rs"]
mod tests;
