//! The built-in step rules: introduction, order closure and last resort.
//! Destructuring and monotonicity rules live in `destruct` and `candidate`.

use crate::candidate;
use crate::destruct;
use crate::error::SolveError;
use crate::goal::{Goal, GoalPattern};
use crate::proof::Proof;
use crate::relation::{instantiate_family, Relation, Shape, Variance};
use crate::rules::{priority, Emit, Reduction, RuleSet, StepRule};
use crate::solver::{Hypothesis, Solver};
use crate::term::TermId;

/// Register every built-in rule.
pub fn install(rules: &mut RuleSet) {
    use GoalPattern::{AnyRelated, Related, Subrel};

    rules.register(StepRule::new("top", priority::INTRO, Related(Shape::Top), top));
    rules.register(StepRule::new("eq_refl", priority::INTRO, Related(Shape::Equality), eq_refl));
    rules.register(StepRule::new("flip_intro", priority::INTRO, Related(Shape::Flip), flip_intro));
    rules.register(StepRule::branching("arrow_intro", priority::INTRO + 1, Related(Shape::Arrow), arrow_intro));
    rules.register(StepRule::branching("forall_intro", priority::INTRO + 1, Related(Shape::Forall), forall_intro));
    rules.register(StepRule::new("match_reduce", priority::INTRO + 2, AnyRelated, destruct::reduce_match));

    rules.register(StepRule::new("subrel_refl", priority::ORDER, Subrel, subrel_refl));
    rules.register(StepRule::new("subrel_extremes", priority::ORDER, Subrel, subrel_extremes));
    rules.register(StepRule::branching("subrel_fact", priority::ORDER + 1, Subrel, subrel_fact));
    rules.register(StepRule::new("subrel_structural", priority::ORDER + 2, Subrel, subrel_structural));
    rules.register(StepRule::branching("subrel_trans", priority::ORDER + 9, Subrel, subrel_trans));

    rules.register(StepRule::branching("destruct", priority::DESTRUCT, GoalPattern::MatchBoth, destruct::destructure));

    rules.register(StepRule::branching("mono_left", priority::MONOTONICITY, AnyRelated, candidate::mono_left));
    rules.register(StepRule::branching("mono_right", priority::MONOTONICITY + 1, AnyRelated, candidate::mono_right));

    rules.register(StepRule::new(
        "eq_congruence",
        priority::MONOTONICITY + 5,
        Related(Shape::Equality),
        eq_congruence,
    ));

    rules.register(StepRule::new("eq_unify", priority::LAST_RESORT, Related(Shape::Equality), eq_unify));
    rules.register(StepRule::new(
        "refl_placeholder",
        priority::LAST_RESORT + 1,
        Related(Shape::Placeholder),
        refl_placeholder,
    ));
    rules.register(StepRule::new("defer_unsolved", priority::LAST_RESORT + 40, GoalPattern::Any, defer_unsolved));
}

fn related(solver: &Solver<'_>, goal: &Goal) -> Result<(TermId, TermId, TermId), SolveError> {
    match *goal {
        Goal::Related { rel, left, right } => Ok((rel, left, right)),
        Goal::Subrel { .. } => Err(solver.no_rule(goal)),
    }
}

fn subrel(solver: &Solver<'_>, goal: &Goal) -> Result<(TermId, TermId), SolveError> {
    match *goal {
        Goal::Subrel { lesser, greater } => Ok((lesser, greater)),
        Goal::Related { .. } => Err(solver.no_rule(goal)),
    }
}

fn top(_: &mut Solver<'_>, _: &Goal) -> Result<Reduction, SolveError> {
    Ok(Reduction::closed())
}

/// Equality of terms that are already identical; binds nothing.
fn eq_refl(solver: &mut Solver<'_>, goal: &Goal) -> Result<Reduction, SolveError> {
    let (_, left, right) = related(solver, goal)?;
    if solver.resolve(left) == solver.resolve(right) {
        Ok(Reduction::closed())
    } else {
        Err(solver.no_rule(goal))
    }
}

fn flip_intro(solver: &mut Solver<'_>, goal: &Goal) -> Result<Reduction, SolveError> {
    let (rel, left, right) = related(solver, goal)?;
    match solver.view(rel) {
        Relation::Flip(inner) => Ok(Reduction::to(vec![Goal::related(inner, right, left)])),
        _ => Err(solver.no_rule(goal)),
    }
}

/// `Arrow(A, B) f g`: assume `A x y` for fresh `x`, `y` and prove
/// `B (f x) (g y)`.
fn arrow_intro<'e>(solver: &mut Solver<'e>, goal: &Goal, emit: &mut Emit<'_, 'e>) -> Result<(), SolveError> {
    let (rel, left, right) = related(solver, goal)?;
    let Relation::Arrow(dom, cod) = solver.view(rel) else {
        return Err(solver.no_rule(goal));
    };
    let x = solver.fresh_constant("x");
    let y = solver.fresh_constant("y");
    let body = applied(solver, goal, left, right, x, y)?;
    let hyp = Hypothesis {
        rel: dom,
        left: x,
        right: y,
        witness: solver.fresh_constant("h"),
    };
    solver.solve_assuming([hyp], &Goal::related(cod, body.0, body.1), &mut |s, proof| {
        emit(s, Reduction::closed().with_premise(proof))
    })
}

/// `Forall(E, F) f g`: assume an edge `e : E v1 v2` and prove
/// `F v1 v2 e (f v1) (g v2)`.
fn forall_intro<'e>(solver: &mut Solver<'e>, goal: &Goal, emit: &mut Emit<'_, 'e>) -> Result<(), SolveError> {
    let (rel, left, right) = related(solver, goal)?;
    let Relation::Forall(edge, family) = solver.view(rel) else {
        return Err(solver.no_rule(goal));
    };
    let v1 = solver.fresh_constant("v");
    let v2 = solver.fresh_constant("v");
    let e = solver.fresh_constant("e");
    let body = applied(solver, goal, left, right, v1, v2)?;
    let inst = instantiate_family(family, v1, v2, e, solver.subst(), solver.vocab(), solver.terms())
        .ok_or_else(|| solver.no_rule(goal))?;
    let hyp = Hypothesis {
        rel: edge,
        left: v1,
        right: v2,
        witness: e,
    };
    solver.solve_assuming([hyp], &Goal::related(inst, body.0, body.1), &mut |s, proof| {
        emit(s, Reduction::closed().with_premise(proof))
    })
}

/// `(f x, g y)`, provided both sides are applications.
fn applied(
    solver: &Solver<'_>,
    goal: &Goal,
    left: TermId,
    right: TermId,
    x: TermId,
    y: TermId,
) -> Result<(TermId, TermId), SolveError> {
    let terms = solver.terms();
    match (
        terms.apply(solver.walk(left), &[x]),
        terms.apply(solver.walk(right), &[y]),
    ) {
        (Some(fx), Some(gy)) => Ok((fx, gy)),
        _ => Err(solver.no_rule(goal)),
    }
}

fn subrel_refl(solver: &mut Solver<'_>, goal: &Goal) -> Result<Reduction, SolveError> {
    let (lesser, greater) = subrel(solver, goal)?;
    if solver.view(lesser) == solver.view(greater) || solver.unify(lesser, greater) {
        Ok(Reduction::closed())
    } else {
        Err(solver.no_rule(goal))
    }
}

fn subrel_extremes(solver: &mut Solver<'_>, goal: &Goal) -> Result<Reduction, SolveError> {
    let (lesser, greater) = subrel(solver, goal)?;
    match (solver.view(lesser), solver.view(greater)) {
        (_, Relation::Top) | (Relation::Bottom, _) => Ok(Reduction::closed()),
        _ => Err(solver.no_rule(goal)),
    }
}

/// One alternative per registered subrel fact matching the goal.
fn subrel_fact<'e>(solver: &mut Solver<'e>, goal: &Goal, emit: &mut Emit<'_, 'e>) -> Result<(), SolveError> {
    let (lesser, greater) = subrel(solver, goal)?;
    let mut best = None;
    for (id, fact) in solver.facts().subrels() {
        let found = solver.attempt(|s| {
            let offset = s.reserve_vars(fact.schematic);
            let terms = s.terms();
            let (fl, fg) = (terms.rename(fact.lesser, offset), terms.rename(fact.greater, offset));
            if s.unify(lesser, fl) && s.unify(greater, fg) {
                emit(s, Reduction::closed().with_premise(Proof::Subrel(id)))
            } else {
                Err(s.no_rule(goal))
            }
        });
        match found {
            Ok(()) => return Ok(()),
            Err(err) if solver.out_of_fuel() => return Err(err),
            Err(err) => best = Some(err.most_specific(best)),
        }
    }
    Err(best.unwrap_or_else(|| solver.no_rule(goal)))
}

/// Monotonicity of each combinator in its `Subrel`-compatible arguments.
fn subrel_structural(solver: &mut Solver<'_>, goal: &Goal) -> Result<Reduction, SolveError> {
    let (lesser, greater) = subrel(solver, goal)?;
    match (solver.view(lesser), solver.view(greater)) {
        (Relation::Arrow(a, b), Relation::Arrow(a2, b2)) => {
            Ok(Reduction::to(vec![Goal::subrel(a2, a), Goal::subrel(b, b2)]))
        }
        (Relation::Flip(a), Relation::Flip(b)) => Ok(Reduction::to(vec![Goal::subrel(a, b)])),
        (Relation::Forall(e, f), Relation::Forall(e2, f2)) => {
            let v1 = solver.fresh_constant("v");
            let v2 = solver.fresh_constant("v");
            let w = solver.fresh_constant("e");
            let (subst, vocab, terms) = (solver.subst(), solver.vocab(), solver.terms());
            match (
                instantiate_family(f, v1, v2, w, subst, vocab, terms),
                instantiate_family(f2, v1, v2, w, subst, vocab, terms),
            ) {
                (Some(fi), Some(f2i)) => Ok(Reduction::to(vec![Goal::subrel(e2, e), Goal::subrel(fi, f2i)])),
                _ => Err(solver.no_rule(goal)),
            }
        }
        (Relation::Named(h, args), Relation::Named(h2, args2)) if h == h2 && args.len() == args2.len() => {
            let variances = solver.facts().variances(h).ok_or_else(|| solver.no_rule(goal))?;
            if variances.len() != args.len() {
                return Err(solver.no_rule(goal));
            }
            let mut subgoals = Vec::with_capacity(args.len());
            for ((a, a2), variance) in args.iter().zip(args2.iter()).zip(variances) {
                match variance {
                    Variance::Covariant => subgoals.push(Goal::subrel(*a, *a2)),
                    Variance::Contravariant => subgoals.push(Goal::subrel(*a2, *a)),
                    Variance::Invariant => {
                        if !solver.unify(*a, *a2) {
                            return Err(solver.no_rule(goal));
                        }
                    }
                }
            }
            Ok(Reduction::to(subgoals))
        }
        _ => Err(solver.no_rule(goal)),
    }
}

/// `R ⊆ T` through a registered `R ⊆ S` and a proof of `S ⊆ T`.
fn subrel_trans<'e>(solver: &mut Solver<'e>, goal: &Goal, emit: &mut Emit<'_, 'e>) -> Result<(), SolveError> {
    let (lesser, greater) = subrel(solver, goal)?;
    let mut best = None;
    for (id, fact) in solver.facts().subrels() {
        let step = solver.attempt(|s| {
            let offset = s.reserve_vars(fact.schematic);
            let terms = s.terms();
            let (fl, fg) = (terms.rename(fact.lesser, offset), terms.rename(fact.greater, offset));
            if !s.unify(lesser, fl) {
                return Err(s.no_rule(goal));
            }
            emit(s, Reduction::to(vec![Goal::subrel(fg, greater)]).with_premise(Proof::Subrel(id)))
        });
        match step {
            Ok(()) => return Ok(()),
            Err(err) if solver.out_of_fuel() => return Err(err),
            Err(err) => best = Some(err.most_specific(best)),
        }
    }
    Err(best.unwrap_or_else(|| solver.no_rule(goal)))
}

/// `h a1 .. an = h b1 .. bn` from `ai = bi`.
fn eq_congruence(solver: &mut Solver<'_>, goal: &Goal) -> Result<Reduction, SolveError> {
    let (rel, left, right) = related(solver, goal)?;
    let terms = solver.terms();
    match (terms.is_app(solver.walk(left)), terms.is_app(solver.walk(right))) {
        (Some((h1, xs)), Some((h2, ys))) if h1 == h2 && xs.len() == ys.len() && !xs.is_empty() => {
            Ok(Reduction::to(
                xs.iter()
                    .zip(ys.iter())
                    .map(|(x, y)| Goal::related(rel, *x, *y))
                    .collect(),
            ))
        }
        _ => Err(solver.no_rule(goal)),
    }
}

/// Equality by unification; commits placeholders.
fn eq_unify(solver: &mut Solver<'_>, goal: &Goal) -> Result<Reduction, SolveError> {
    let (_, left, right) = related(solver, goal)?;
    if solver.unify(left, right) {
        Ok(Reduction::closed())
    } else {
        Err(solver.no_rule(goal))
    }
}

/// An unconstrained relation holds reflexively: bind it to equality.
fn refl_placeholder(solver: &mut Solver<'_>, goal: &Goal) -> Result<Reduction, SolveError> {
    let (rel, left, right) = related(solver, goal)?;
    let eq = solver.vocab().equality(solver.terms());
    if solver.unify(left, right) && solver.unify(rel, eq) {
        Ok(Reduction::closed())
    } else {
        Err(solver.no_rule(goal))
    }
}

fn defer_unsolved(solver: &mut Solver<'_>, goal: &Goal) -> Result<Reduction, SolveError> {
    if !solver.config().defer_unsolved {
        return Err(solver.no_rule(goal));
    }
    let proof = solver.defer(goal);
    Ok(Reduction::closed().with_premise(proof))
}

#[cfg(test)]
#[path = "tests/builtin.rs"]
mod tests;
