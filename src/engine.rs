//! Engine - registries, builders and the query entry points.
//!
//! An [`Engine`] is populated through `&mut self` (combinators, facts,
//! parameter counts, step rules, destructuring schemes, computations) and
//! then queried through `&self`. Every [`Engine::solve`] runs in its own
//! [`Solver`] context, so independent solves may share one engine across
//! threads.

use crate::builtin;
use crate::config::SolverConfig;
use crate::delay::{reify, Conj, Pending};
use crate::destruct::DestructScheme;
use crate::error::SolveError;
use crate::facts::{FactId, FactRegistry, SubrelId};
use crate::goal::{format_goal, Goal, GoalPattern};
use crate::relation::{Variance, Vocab};
use crate::rules::{Emit, Reduction, RuleSet, StepRule};
use crate::solver::{Solution, Solver};
use crate::symbol::{FuncId, SymbolStore};
use crate::term::{format_term, MatchArm, TermId, TermStore};
use crate::transport::{self, Computation, Transported};
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::debug_span;

pub struct Engine {
    pub(crate) symbols: SymbolStore,
    pub(crate) terms: TermStore,
    pub(crate) vocab: Vocab,
    pub(crate) facts: FactRegistry,
    pub(crate) rules: RuleSet,
    pub(crate) config: SolverConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with the built-in rules installed and default limits.
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        let symbols = SymbolStore::new();
        let vocab = Vocab::new(&symbols);
        let mut rules = RuleSet::new();
        builtin::install(&mut rules);
        Self {
            symbols,
            terms: TermStore::new(),
            vocab,
            facts: FactRegistry::new(),
            rules,
            config,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SolverConfig) {
        self.config = config;
    }

    pub fn symbols(&self) -> &SymbolStore {
        &self.symbols
    }

    pub fn terms(&self) -> &TermStore {
        &self.terms
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    pub fn facts(&self) -> &FactRegistry {
        &self.facts
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    // ------------------------------------------------------------------
    // Registration

    /// Declare `head` a relation combinator with one variance per argument.
    pub fn register_relation_combinator(&mut self, head: FuncId, variances: &[Variance]) {
        self.facts
            .set_combinator(head, SmallVec::from_slice(variances));
    }

    pub fn register_fact(
        &mut self,
        rel: TermId,
        left: TermId,
        right: TermId,
        witness: TermId,
    ) -> FactId {
        self.facts.add_fact(&self.terms, rel, left, right, witness)
    }

    pub fn register_self_fact(&mut self, rel: TermId, term: TermId, witness: TermId) -> FactId {
        self.facts.add_self_fact(&self.terms, rel, term, witness)
    }

    /// Register `lesser ⊆ greater`.
    pub fn register_subrel(&mut self, lesser: TermId, greater: TermId, witness: TermId) -> SubrelId {
        self.facts.add_subrel(&self.terms, lesser, greater, witness)
    }

    /// Applications of `head` keep their first `count` arguments fixed when
    /// used as candidates.
    pub fn register_parameter_count(&mut self, head: FuncId, count: usize) {
        self.facts.set_parameter_count(head, count);
    }

    pub fn register_step_rule<F>(&mut self, name: &str, priority: i32, pattern: GoalPattern, reduce: F)
    where
        F: Fn(&mut Solver<'_>, &Goal) -> Result<Reduction, SolveError> + Send + Sync + 'static,
    {
        self.rules.register(StepRule::new(name, priority, pattern, reduce));
    }

    /// Register a rule that may reduce its goal in several ways; see
    /// [`StepRule::branching`].
    pub fn register_branching_rule<F>(&mut self, name: &str, priority: i32, pattern: GoalPattern, reduce: F)
    where
        F: for<'s, 'k> Fn(&mut Solver<'s>, &Goal, &mut Emit<'k, 's>) -> Result<(), SolveError>
            + Send
            + Sync
            + 'static,
    {
        self.rules.register(StepRule::branching(name, priority, pattern, reduce));
    }

    pub fn register_destructuring_scheme(&mut self, combinator: FuncId, scheme: DestructScheme) {
        self.facts.set_scheme(combinator, scheme);
    }

    /// Record that `term` evaluates to `value`.
    pub fn register_computation(&mut self, term: TermId, value: TermId) {
        self.facts.add_computation(term, value);
    }

    // ------------------------------------------------------------------
    // Builders

    pub fn sym(&self, name: &str) -> FuncId {
        self.symbols.intern(name)
    }

    pub fn constant(&self, name: &str) -> TermId {
        self.terms.app0(self.sym(name))
    }

    pub fn app(&self, head: &str, args: &[TermId]) -> TermId {
        self.terms.app(self.sym(head), SmallVec::from_slice(args))
    }

    pub fn var(&self, index: u32) -> TermId {
        self.terms.var(index)
    }

    pub fn eq(&self) -> TermId {
        self.vocab.equality(&self.terms)
    }

    pub fn top(&self) -> TermId {
        self.vocab.top(&self.terms)
    }

    pub fn bottom(&self) -> TermId {
        self.vocab.bottom(&self.terms)
    }

    pub fn arrow(&self, dom: TermId, cod: TermId) -> TermId {
        self.vocab.arrow(&self.terms, dom, cod)
    }

    pub fn forall(&self, edge: TermId, family: TermId) -> TermId {
        self.vocab.forall(&self.terms, edge, family)
    }

    pub fn flip(&self, rel: TermId) -> TermId {
        self.vocab.flip(&self.terms, rel)
    }

    pub fn const_family(&self, rel: TermId) -> TermId {
        self.vocab.const_family(&self.terms, rel)
    }

    /// A named relation or relator application.
    pub fn named(&self, head: &str, args: &[TermId]) -> TermId {
        self.app(head, args)
    }

    pub fn arm(&self, ctor: &str, arity: u32, body: TermId) -> MatchArm {
        MatchArm {
            ctor: self.sym(ctor),
            arity,
            body,
        }
    }

    pub fn match_on(&self, scrutinee: TermId, arms: &[MatchArm]) -> TermId {
        self.terms.match_on(scrutinee, SmallVec::from_slice(arms))
    }

    // ------------------------------------------------------------------
    // Queries

    /// Prove `goal`. Placeholders in the goal are bound in the returned
    /// solution; the engine itself is not modified.
    pub fn solve(&self, goal: &Goal) -> Solution {
        let first_free = goal.max_var(&self.terms).map_or(0, |m| m + 1);
        let mut solver = Solver::new(self, first_free);
        #[cfg(feature = "tracing")]
        let _span = debug_span!("solve", goal = %self.format_goal(goal)).entered();
        let result = solver.prove(goal);
        solver.finish(goal, result)
    }

    /// The deferred obligations packed in a closed witness, in deferral order.
    pub fn reify(&self, witness: &Conj) -> Result<Vec<Pending>, SolveError> {
        reify(witness)
    }

    /// Move the forall fact `forall_fact` across the edge `edge_fact`, given
    /// what the left function computes at the edge's left end.
    pub fn transport(
        &self,
        forall_fact: FactId,
        edge_fact: FactId,
        computation: Computation,
    ) -> Result<Transported, SolveError> {
        transport::transport(self, forall_fact, edge_fact, computation)
    }

    pub fn format_term(&self, term: TermId) -> String {
        format_term(term, &self.terms, &self.symbols).unwrap_or_else(|e| e)
    }

    pub fn format_goal(&self, goal: &Goal) -> String {
        format_goal(goal, &self.terms, &self.symbols).unwrap_or_else(|e| e)
    }
}

#[cfg(test)]
#[path = "tests/engine.rs"]
mod tests;
