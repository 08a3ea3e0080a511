//! Candidate selection and the monotonicity rules.
//!
//! For a goal `R (h a1 .. an) n` a candidate is a fact or hypothesis
//! `R' f g` with `f = h a1 .. ak`. The unconsumed arguments `a(k+1) .. an`
//! are eliminated through `R'` and what is left of `R'` is bridged to `R`.
//!
//! With a declared parameter count `p` for `h` the registry is consulted
//! once, for facts that keep the first `p` arguments. Otherwise every
//! prefix length is probed from `n` down to `0`.
//!
//! Every candidate, and every proof of a forall edge or of a bridging
//! `Subrel` goal, is a separate alternative of the rule: the argument
//! obligations it leaves are proved by the solver, and their failure sends
//! the search back here for the next one.

use crate::error::SolveError;
use crate::facts::{Anchor, FactId};
use crate::goal::Goal;
use crate::proof::Proof;
use crate::relation::{instantiate_family, Relation};
use crate::rules::{Emit, Reduction};
use crate::solver::Solver;
use crate::symbol::FuncId;
use crate::term::TermId;
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Index into the solver's hypotheses.
    Hypothesis(usize),
    Fact(FactId),
}

/// A fact or hypothesis proposed for a goal, renamed apart for this use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub source: Source,
    pub rel: TermId,
    pub left: TermId,
    pub right: TermId,
    pub witness: TermId,
    /// How many arguments of the anchored side the candidate covers.
    pub consumed: usize,
}

impl Candidate {
    pub fn side(&self, anchor: Anchor) -> TermId {
        match anchor {
            Anchor::Left => self.left,
            Anchor::Right => self.right,
        }
    }

    pub fn proof(&self) -> Proof {
        match self.source {
            Source::Hypothesis(_) => Proof::Hypothesis(self.witness),
            Source::Fact(id) => Proof::Fact {
                id,
                witness: self.witness,
            },
        }
    }
}

/// Left-anchored monotonicity: the left side is concrete.
pub(crate) fn mono_left<'e>(
    solver: &mut Solver<'e>,
    goal: &Goal,
    emit: &mut Emit<'_, 'e>,
) -> Result<(), SolveError> {
    monotone(solver, goal, Anchor::Left, emit)
}

/// Right-anchored monotonicity: the left side is a placeholder and the right
/// side is concrete.
pub(crate) fn mono_right<'e>(
    solver: &mut Solver<'e>,
    goal: &Goal,
    emit: &mut Emit<'_, 'e>,
) -> Result<(), SolveError> {
    let Goal::Related { left, .. } = *goal else {
        return Err(solver.no_rule(goal));
    };
    if solver.terms().is_var(solver.walk(left)).is_none() {
        return Err(solver.no_rule(goal));
    }
    monotone(solver, goal, Anchor::Right, emit)
}

/// The anchored side's head and arguments, or `NoCandidate` if that side is
/// not an application.
fn anchored_app(
    solver: &Solver<'_>,
    goal: &Goal,
    term: TermId,
) -> Result<(FuncId, SmallVec<[TermId; 4]>), SolveError> {
    solver
        .terms()
        .is_app(solver.walk(term))
        .ok_or_else(|| SolveError::NoCandidate(solver.describe(goal)))
}

/// The first non-empty batch of candidates for `term` anchored at `anchor`,
/// in the order they would be tried.
pub fn select(
    solver: &mut Solver<'_>,
    anchor: Anchor,
    term: TermId,
) -> Result<Vec<Candidate>, SolveError> {
    let goal_text = || format!("term #{}", term.raw());
    let Some((head, args)) = solver.terms().is_app(solver.walk(term)) else {
        return Err(SolveError::NoCandidate(goal_text()));
    };
    for batch in Batches::new(solver, head, args.len()) {
        let found = probe(solver, anchor, head, batch);
        if !found.is_empty() {
            return Ok(found);
        }
    }
    Err(SolveError::NoCandidate(goal_text()))
}

/// One registry lookup.
#[derive(Debug, Clone, Copy)]
enum Batch {
    /// Facts covering exactly this many arguments.
    Exact(usize),
    /// Facts keeping the first `params` of `arity` arguments, longest first.
    Parameters { params: usize, arity: usize },
}

struct Batches {
    next: Option<Batch>,
}

impl Batches {
    fn new(solver: &Solver<'_>, head: FuncId, arity: usize) -> Self {
        let next = match solver.facts().parameter_count(head) {
            Some(params) if params <= arity => Batch::Parameters { params, arity },
            _ => Batch::Exact(arity),
        };
        Self { next: Some(next) }
    }
}

impl Iterator for Batches {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let current = self.next.take()?;
        self.next = match current {
            Batch::Exact(k) if k > 0 => Some(Batch::Exact(k - 1)),
            _ => None,
        };
        Some(current)
    }
}

fn covers(batch: Batch, arity: usize) -> bool {
    match batch {
        Batch::Exact(k) => arity == k,
        Batch::Parameters { params, arity: n } => (params..=n).contains(&arity),
    }
}

/// Hypotheses first, then registered facts in registration order.
fn probe(solver: &mut Solver<'_>, anchor: Anchor, head: FuncId, batch: Batch) -> Vec<Candidate> {
    solver.stats_mut().candidate_probes += 1;
    let terms = solver.terms();
    let facts = solver.facts();
    let mut found = Vec::new();

    for (idx, hyp) in solver.hypotheses().iter().enumerate() {
        let side = match anchor {
            Anchor::Left => hyp.left,
            Anchor::Right => hyp.right,
        };
        if let Some((h, args)) = terms.is_app(solver.walk(side)) {
            if h == head && covers(batch, args.len()) {
                found.push(Candidate {
                    source: Source::Hypothesis(idx),
                    rel: hyp.rel,
                    left: hyp.left,
                    right: hyp.right,
                    witness: hyp.witness,
                    consumed: args.len(),
                });
            }
        }
    }

    let ids = match batch {
        Batch::Exact(k) => facts.by_shape(anchor, head, k),
        Batch::Parameters { .. } => facts.by_head(anchor, head),
    };
    for id in ids {
        let Some(fact) = facts.fact(id) else { continue };
        let Some((_, args)) = terms.is_app(fact.side(anchor)) else {
            continue;
        };
        if !covers(batch, args.len()) {
            continue;
        }
        let offset = solver.reserve_vars(fact.schematic);
        found.push(Candidate {
            source: Source::Fact(id),
            rel: terms.rename(fact.rel, offset),
            left: terms.rename(fact.left, offset),
            right: terms.rename(fact.right, offset),
            witness: terms.rename(fact.witness, offset),
            consumed: args.len(),
        });
    }

    if let Batch::Parameters { .. } = batch {
        found.sort_by_key(|c| std::cmp::Reverse(c.consumed));
        // Hypotheses stay ahead of facts.
        found.sort_by_key(|c| matches!(c.source, Source::Fact(_)));
    }
    found
}

fn monotone<'e>(
    solver: &mut Solver<'e>,
    goal: &Goal,
    anchor: Anchor,
    emit: &mut Emit<'_, 'e>,
) -> Result<(), SolveError> {
    let Goal::Related { left, right, .. } = *goal else {
        return Err(solver.no_rule(goal));
    };
    let anchored = match anchor {
        Anchor::Left => left,
        Anchor::Right => right,
    };
    let (head, args) = anchored_app(solver, goal, anchored)?;

    let mut best: Option<SolveError> = None;
    for batch in Batches::new(solver, head, args.len()) {
        for candidate in probe(solver, anchor, head, batch) {
            #[cfg(feature = "tracing")]
            trace!(source = ?candidate.source, consumed = candidate.consumed, "candidate");
            match solver.attempt(|s| complete(s, goal, anchor, &candidate, &mut *emit)) {
                Ok(()) => return Ok(()),
                Err(err) if solver.out_of_fuel() => return Err(err),
                Err(err) => best = Some(err.most_specific(best)),
            }
        }
    }
    Err(best.unwrap_or_else(|| SolveError::NoCandidate(solver.describe(goal))))
}

/// Line the candidate up with the goal, eliminate the leftover arguments and
/// bridge the residual relation, then emit the argument obligations.
fn complete<'e>(
    solver: &mut Solver<'e>,
    goal: &Goal,
    anchor: Anchor,
    candidate: &Candidate,
    emit: &mut Emit<'_, 'e>,
) -> Result<(), SolveError> {
    let Goal::Related { rel, left, right } = *goal else {
        return Err(solver.no_rule(goal));
    };
    let anchored = match anchor {
        Anchor::Left => left,
        Anchor::Right => right,
    };
    let (_, args) = anchored_app(solver, goal, anchored)?;
    let extra = args.len() - candidate.consumed;

    let left_args = split_side(solver, goal, left, candidate.side(Anchor::Left), extra)?;
    let right_args = split_side(solver, goal, right, candidate.side(Anchor::Right), extra)?;
    let pairs: SmallVec<[(TermId, TermId); 4]> = left_args.into_iter().zip(right_args).collect();

    let elim = Elimination {
        premises: vec![candidate.proof()],
        subgoals: Vec::new(),
    };
    eliminate_all(solver, goal, candidate.rel, &pairs, elim, &mut |s, residual, elim| {
        bridge(s, goal, residual, rel, elim, &mut |s, elim| {
            emit(
                s,
                Reduction {
                    subgoals: elim.subgoals,
                    premises: elim.premises,
                },
            )
        })
    })
}

/// Split `side` into `base` applied to `extra` trailing arguments. A
/// placeholder side is bound to `base` applied to fresh placeholders.
fn split_side(
    solver: &mut Solver<'_>,
    goal: &Goal,
    side: TermId,
    base: TermId,
    extra: usize,
) -> Result<SmallVec<[TermId; 4]>, SolveError> {
    let terms = solver.terms();
    let side = solver.walk(side);
    let mismatch = |s: &Solver<'_>| SolveError::NoCandidate(s.describe(goal));

    if terms.is_var(side).is_some() {
        let args: SmallVec<[TermId; 4]> = (0..extra).map(|_| solver.fresh_var()).collect();
        let value = if extra == 0 {
            base
        } else {
            terms.apply(solver.walk(base), &args).ok_or_else(|| mismatch(solver))?
        };
        return if solver.unify(side, value) {
            Ok(args)
        } else {
            Err(mismatch(solver))
        };
    }

    let (_, args) = terms.is_app(side).ok_or_else(|| mismatch(solver))?;
    if args.len() < extra {
        return Err(mismatch(solver));
    }
    let keep = args.len() - extra;
    let prefix = terms.prefix(side, keep).ok_or_else(|| mismatch(solver))?;
    if !solver.unify(prefix, base) {
        return Err(mismatch(solver));
    }
    Ok(SmallVec::from_slice(&args[keep..]))
}

#[derive(Debug, Clone)]
struct Elimination {
    premises: Vec<Proof>,
    /// Argument obligations, proved after bridging.
    subgoals: Vec<Goal>,
}

/// Continuation of an elimination: the relation reached and what it cost.
type Eliminated<'a, 'e> = dyn FnMut(&mut Solver<'e>, TermId, Elimination) -> Result<(), SolveError> + 'a;

/// Continuation of a bridge.
type Bridged<'a, 'e> = dyn FnMut(&mut Solver<'e>, Elimination) -> Result<(), SolveError> + 'a;

/// Consume the argument pairs left to right.
fn eliminate_all<'e>(
    solver: &mut Solver<'e>,
    goal: &Goal,
    rel: TermId,
    pairs: &[(TermId, TermId)],
    elim: Elimination,
    k: &mut Eliminated<'_, 'e>,
) -> Result<(), SolveError> {
    let Some((&(a, b), rest)) = pairs.split_first() else {
        return k(solver, rel, elim);
    };
    eliminate(solver, goal, rel, a, b, elim, &mut |s, residual, elim| {
        eliminate_all(s, goal, residual, rest, elim, &mut *k)
    })
}

/// Consume one argument pair `(a, b)` through `rel` and pass on the
/// relation that then holds between the applied sides.
fn eliminate<'e>(
    solver: &mut Solver<'e>,
    goal: &Goal,
    rel: TermId,
    a: TermId,
    b: TermId,
    mut elim: Elimination,
    k: &mut Eliminated<'_, 'e>,
) -> Result<(), SolveError> {
    let vocab = solver.vocab();
    let terms = solver.terms();
    match solver.view(rel) {
        Relation::Arrow(dom, cod) => {
            elim.subgoals.push(Goal::related(dom, a, b));
            k(solver, cod, elim)
        }
        Relation::Forall(edge, family) => eliminate_forall(solver, goal, edge, family, (a, b), elim, k),
        Relation::Equality => {
            elim.subgoals.push(Goal::related(rel, a, b));
            k(solver, rel, elim)
        }
        Relation::Top => k(solver, rel, elim),
        Relation::Placeholder(_) => {
            let (dom, cod) = (solver.fresh_var(), solver.fresh_var());
            if !solver.unify(rel, vocab.arrow(terms, dom, cod)) {
                return Err(gap(solver, goal));
            }
            elim.subgoals.push(Goal::related(dom, a, b));
            k(solver, cod, elim)
        }
        // `Flip(R) (f a) (g b)` is `R (g b) (f a)`: eliminate under `R` with
        // the pair swapped and flip the result back.
        Relation::Flip(inner) => match solver.view(inner) {
            Relation::Equality | Relation::Top => eliminate(solver, goal, inner, a, b, elim, k),
            Relation::Arrow(..) | Relation::Forall(..) | Relation::Placeholder(_) => {
                eliminate(solver, goal, inner, b, a, elim, &mut |s, residual, elim| {
                    k(s, vocab.flip(terms, residual), elim)
                })
            }
            _ => Err(gap(solver, goal)),
        },
        _ => Err(gap(solver, goal)),
    }
}

/// The edge is proved before going on: its witness indexes the family.
fn eliminate_forall<'e>(
    solver: &mut Solver<'e>,
    goal: &Goal,
    edge: TermId,
    family: TermId,
    (a, b): (TermId, TermId),
    elim: Elimination,
    k: &mut Eliminated<'_, 'e>,
) -> Result<(), SolveError> {
    let edge_goal = Goal::related(edge, a, b);
    solver.solve_goal(&edge_goal, &mut |s: &mut Solver<'e>, proof: Proof| {
        let witness = match proof.witness_term() {
            Some(w) => w,
            None => s.fresh_constant("e"),
        };
        let inst = instantiate_family(family, a, b, witness, s.subst(), s.vocab(), s.terms())
            .ok_or_else(|| gap(s, goal))?;
        let mut elim = elim.clone();
        elim.premises.push(proof);
        k(s, inst, elim)
    })
}

/// Close the gap between the relation the candidate delivers and the goal's.
/// Each proof of `Subrel(found, wanted)` is a separate way across.
fn bridge<'e>(
    solver: &mut Solver<'e>,
    goal: &Goal,
    found: TermId,
    wanted: TermId,
    elim: Elimination,
    k: &mut Bridged<'_, 'e>,
) -> Result<(), SolveError> {
    if solver.view(found) == solver.view(wanted) {
        return k(solver, elim);
    }
    let mut crossed = false;
    let result = solver.solve_goal(&Goal::subrel(found, wanted), &mut |s: &mut Solver<'e>, proof: Proof| {
        crossed = true;
        let mut elim = elim.clone();
        elim.premises.push(proof);
        k(s, elim)
    });
    match result {
        Err(SolveError::DepthExceeded { .. }) | Ok(()) => result,
        Err(_) if !crossed => Err(gap(solver, goal)),
        Err(err) => Err(err),
    }
}

fn gap(solver: &Solver<'_>, goal: &Goal) -> SolveError {
    SolveError::UnbridgeableGap(solver.describe(goal))
}

#[cfg(test)]
#[path = "tests/candidate.rs"]
mod tests;
