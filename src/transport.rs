//! Transport: moving a relational fact across a function application whose
//! result on one side is known.
//!
//! From `f ~ g` under `Forall(E, F)`, an edge `e : E a b` and a computation
//! about either side, `g b ⇓ C y1 .. yk` or `f a ⇓ C x1 .. xk`, derive the
//! value on the other side: `f a` is `C' x1 .. xk` (or `g b` is
//! `C' y1 .. yk`) with the fields related as the destructuring scheme of
//! `F a b e` prescribes. The field obligations go through the solver, which
//! proves or defers each of them.

use crate::destruct::{field_relation, CasePair};
use crate::engine::Engine;
use crate::error::SolveError;
use crate::facts::{Anchor, Fact, FactId};
use crate::goal::Goal;
use crate::proof::Proof;
use crate::relation::{instantiate_family, Relation};
use crate::solver::{SeqCont, Solution, Solver};
use crate::term::TermId;
use smallvec::SmallVec;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::trace::debug;

/// `term ⇓ value`: `term` evaluates to the constructor application `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Computation {
    pub term: TermId,
    pub value: TermId,
}

impl Computation {
    pub fn new(term: TermId, value: TermId) -> Self {
        Self { term, value }
    }
}

/// Result of a transport.
#[derive(Debug, Clone)]
pub struct Transported {
    /// Which application the value was derived for: `Left` for `f a` when
    /// the computation was about `g b`, `Right` for `g b` otherwise.
    pub derived: Anchor,
    /// The fields of the derived value, as far as they are known.
    pub witnesses: Vec<TermId>,
    /// The derived value, `C' z1 .. zk`.
    pub value: TermId,
    /// The instantiated result relation `F a b e`.
    pub relation: TermId,
    /// Outcome of the field obligations; deferred ones are in its witness.
    pub residual: Solution,
}

fn not_transportable(what: &str) -> SolveError {
    SolveError::NotTransportable(what.to_string())
}

pub(crate) fn transport(
    engine: &Engine,
    forall_fact: FactId,
    edge_fact: FactId,
    computation: Computation,
) -> Result<Transported, SolveError> {
    let facts = engine.facts();
    let terms = engine.terms();
    let lifted = *facts
        .fact(forall_fact)
        .ok_or(SolveError::UnknownFact(forall_fact))?;
    let edge = *facts
        .fact(edge_fact)
        .ok_or(SolveError::UnknownFact(edge_fact))?;

    let first_free = [computation.term, computation.value]
        .iter()
        .filter_map(|t| terms.max_var(*t))
        .max()
        .map_or(0, |m| m + 1);
    let mut solver = Solver::new(engine, first_free);
    let lifted = renamed(&mut solver, &lifted);
    let edge = renamed(&mut solver, &edge);

    let (edge_rel, result_rel) = match solver.view(lifted.rel) {
        Relation::Forall(e, family) => (e, ResultRel::Family(family)),
        Relation::Arrow(e, cod) => (e, ResultRel::Fixed(cod)),
        _ => return Err(not_transportable("first fact is not a forall or arrow fact")),
    };

    let premises = vec![
        Proof::Fact {
            id: forall_fact,
            witness: lifted.witness,
        },
        Proof::Fact {
            id: edge_fact,
            witness: edge.witness,
        },
    ];

    let mut found: Option<Found> = None;
    bridge_edge(&mut solver, edge.rel, edge_rel, &mut |s, bridged| {
        let mut premises = premises.clone();
        premises.extend(bridged);
        let plan = plan(s, &lifted, &edge, result_rel, computation)?;

        #[cfg(feature = "tracing")]
        debug!(fields = plan.obligations.len(), derived = ?plan.derived, "transport");

        discharge(s, &plan.obligations, premises, &mut |s, premises| {
            found = Some(Found {
                derived: plan.derived,
                witnesses: plan.unknown.iter().map(|z| s.resolve(*z)).collect(),
                value: s.resolve(plan.value),
                relation: s.resolve(plan.relation),
                summary: plan.summary,
                premises,
            });
            Ok(())
        })
    })?;

    let found = found.ok_or_else(|| not_transportable("no transport was completed"))?;
    let proof = Proof::step(&Arc::from("transport"), found.premises);
    Ok(Transported {
        derived: found.derived,
        witnesses: found.witnesses,
        value: found.value,
        relation: found.relation,
        residual: solver.finish(&found.summary, Ok(proof)),
    })
}

/// What an accepted transport recorded before the solver is packaged.
struct Found {
    derived: Anchor,
    witnesses: Vec<TermId>,
    value: TermId,
    relation: TermId,
    summary: Goal,
    premises: Vec<Proof>,
}

/// Continuation of the edge bridge, given the bridging proof if one was
/// needed.
type Bridged<'a, 'e> = dyn FnMut(&mut Solver<'e>, Option<Proof>) -> Result<(), SolveError> + 'a;

/// The edge fact may sit under a smaller relation than the forall expects.
fn bridge_edge<'e>(
    solver: &mut Solver<'e>,
    found: TermId,
    wanted: TermId,
    k: &mut Bridged<'_, 'e>,
) -> Result<(), SolveError> {
    if solver.unify(found, wanted) {
        return k(solver, None);
    }
    let goal = Goal::subrel(found, wanted);
    let mut crossed = false;
    let result = solver.solve_goal(&goal, &mut |s: &mut Solver<'e>, proof: Proof| {
        crossed = true;
        k(s, Some(proof))
    });
    match result {
        Err(_) if !crossed => Err(SolveError::UnbridgeableGap(solver.describe(&goal))),
        _ => result,
    }
}

/// The derived side's value and the obligations relating its fields to the
/// known ones.
struct Plan {
    derived: Anchor,
    unknown: SmallVec<[TermId; 4]>,
    value: TermId,
    relation: TermId,
    obligations: Vec<Goal>,
    summary: Goal,
}

fn plan(
    solver: &mut Solver<'_>,
    lifted: &Fact,
    edge: &Fact,
    result_rel: ResultRel,
    computation: Computation,
) -> Result<Plan, SolveError> {
    let facts = solver.facts();
    let terms = solver.terms();
    let (a, b) = (edge.left, edge.right);
    let applied_left = terms
        .apply(solver.walk(lifted.left), &[a])
        .ok_or_else(|| not_transportable("left function is not an application"))?;
    let applied_right = terms
        .apply(solver.walk(lifted.right), &[b])
        .ok_or_else(|| not_transportable("right function is not an application"))?;

    // A computation about `g b` determines the left value, one about `f a`
    // the right value.
    let (derived, other) = if solver.unify(computation.term, applied_right) {
        (Anchor::Left, applied_left)
    } else if solver.unify(computation.term, applied_left) {
        (Anchor::Right, applied_right)
    } else {
        return Err(not_transportable("computation is about neither function at the edge"));
    };

    let relation = match result_rel {
        ResultRel::Family(family) => instantiate_family(
            family,
            a,
            b,
            edge.witness,
            solver.subst(),
            solver.vocab(),
            terms,
        )
        .ok_or_else(|| not_transportable("result family cannot be instantiated"))?,
        ResultRel::Fixed(cod) => cod,
    };

    let Relation::Named(head, args) = solver.view(relation) else {
        return Err(not_transportable("result relation is not a registered relator"));
    };
    let scheme = facts
        .scheme(head)
        .ok_or_else(|| not_transportable("result relation has no destructuring scheme"))?;
    let (ctor, known) = terms
        .is_app(solver.walk(computation.value))
        .ok_or_else(|| not_transportable("computed value is not a constructor application"))?;
    let case: &CasePair = match derived {
        Anchor::Left => scheme.for_right(ctor),
        Anchor::Right => scheme.for_left(ctor),
    }
    .filter(|c| c.fields.len() == known.len())
    .ok_or_else(|| not_transportable("no scheme case for the computed constructor"))?;

    let unknown: SmallVec<[TermId; 4]> = (0..known.len()).map(|_| solver.fresh_var()).collect();
    let ctor = match derived {
        Anchor::Left => case.left,
        Anchor::Right => case.right,
    };
    let value = terms.app(ctor, unknown.clone());
    if let Some(computed) = facts.computation(solver.resolve(other)) {
        if !solver.unify(value, computed) {
            return Err(not_transportable("the other function computes to an unrelated value"));
        }
    }

    let mut obligations = Vec::with_capacity(known.len());
    for (i, field) in case.fields.iter().enumerate() {
        let field_rel = field_relation(*field, relation, &args)
            .ok_or_else(|| not_transportable("scheme refers to a missing relator argument"))?;
        let (x, y) = match derived {
            Anchor::Left => (unknown[i], known[i]),
            Anchor::Right => (known[i], unknown[i]),
        };
        obligations.push(Goal::related(field_rel, x, y));
    }

    Ok(Plan {
        derived,
        unknown,
        value,
        relation,
        obligations,
        summary: Goal::related(relation, applied_left, applied_right),
    })
}

/// Prove each obligation in order, deferring the ones that have no proof
/// compatible with those before them.
fn discharge<'e>(
    solver: &mut Solver<'e>,
    obligations: &[Goal],
    done: Vec<Proof>,
    k: &mut SeqCont<'_, 'e>,
) -> Result<(), SolveError> {
    let Some((goal, rest)) = obligations.split_first() else {
        return k(solver, done);
    };
    let solved = solver.attempt(|s| {
        s.solve_goal(goal, &mut |s: &mut Solver<'e>, proof: Proof| {
            let mut done = done.clone();
            done.push(proof);
            discharge(s, rest, done, &mut *k)
        })
    });
    match solved {
        Err(SolveError::DepthExceeded { .. }) | Ok(()) => solved,
        Err(_) => {
            let mut done = done;
            done.push(solver.defer(goal));
            discharge(solver, rest, done, k)
        }
    }
}

/// How the result relation is obtained from the forall fact.
#[derive(Clone, Copy)]
enum ResultRel {
    Family(TermId),
    Fixed(TermId),
}

/// A copy of `fact` with its schematic placeholders renamed apart.
fn renamed(solver: &mut Solver<'_>, fact: &Fact) -> Fact {
    let offset = solver.reserve_vars(fact.schematic);
    let terms = solver.terms();
    Fact {
        rel: terms.rename(fact.rel, offset),
        left: terms.rename(fact.left, offset),
        right: terms.rename(fact.right, offset),
        witness: terms.rename(fact.witness, offset),
        ..*fact
    }
}

#[cfg(test)]
#[path = "tests/transport.rs"]
mod tests;
