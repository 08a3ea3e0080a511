//! Library relators for options, products, sums and lists.
//!
//! These are ordinary clients of the registration interface: each relator is
//! declared a covariant combinator, given a destructuring scheme and an
//! introduction rule that relates two constructor applications field by
//! field. Hosts with their own base library can skip [`Relators::install`]
//! and register equivalents.

use crate::destruct::{field_relation, DestructScheme, FieldRel};
use crate::engine::Engine;
use crate::error::SolveError;
use crate::goal::{Goal, GoalPattern};
use crate::relation::{Relation, Shape, Variance};
use crate::rules::{priority, Reduction};
use crate::solver::Solver;
use crate::symbol::FuncId;
use crate::term::TermId;

/// Symbols of the installed relators and their constructors.
#[derive(Debug, Clone, Copy)]
pub struct Relators {
    pub option_rel: FuncId,
    pub none: FuncId,
    pub some: FuncId,
    pub prod_rel: FuncId,
    pub pair: FuncId,
    pub sum_rel: FuncId,
    pub inl: FuncId,
    pub inr: FuncId,
    pub list_rel: FuncId,
    pub nil: FuncId,
    pub cons: FuncId,
}

impl Relators {
    pub fn install(engine: &mut Engine) -> Self {
        let relators = Self {
            option_rel: engine.sym("option_rel"),
            none: engine.sym("None"),
            some: engine.sym("Some"),
            prod_rel: engine.sym("prod_rel"),
            pair: engine.sym("pair"),
            sum_rel: engine.sym("sum_rel"),
            inl: engine.sym("inl"),
            inr: engine.sym("inr"),
            list_rel: engine.sym("list_rel"),
            nil: engine.sym("nil"),
            cons: engine.sym("cons"),
        };

        use FieldRel::{Arg, Recursive};
        let covariant = Variance::Covariant;
        let r = &relators;
        let table = [
            (
                r.option_rel,
                "option_rel_intro",
                vec![covariant],
                DestructScheme::new()
                    .case(r.none, r.none, &[])
                    .case(r.some, r.some, &[Arg(0)]),
            ),
            (
                r.prod_rel,
                "prod_rel_intro",
                vec![covariant, covariant],
                DestructScheme::new().case(r.pair, r.pair, &[Arg(0), Arg(1)]),
            ),
            (
                r.sum_rel,
                "sum_rel_intro",
                vec![covariant, covariant],
                DestructScheme::new()
                    .case(r.inl, r.inl, &[Arg(0)])
                    .case(r.inr, r.inr, &[Arg(1)]),
            ),
            (
                r.list_rel,
                "list_rel_intro",
                vec![covariant],
                DestructScheme::new()
                    .case(r.nil, r.nil, &[])
                    .case(r.cons, r.cons, &[Arg(0), Recursive]),
            ),
        ];

        for (head, rule, variances, scheme) in table {
            engine.register_relation_combinator(head, &variances);
            engine.register_destructuring_scheme(head, scheme);
            engine.register_step_rule(
                rule,
                priority::INTRO + 3,
                GoalPattern::Related(Shape::Named(head)),
                relator_intro,
            );
        }
        relators
    }

    pub fn option(&self, engine: &Engine, rel: TermId) -> TermId {
        engine.terms().app1(self.option_rel, rel)
    }

    pub fn prod(&self, engine: &Engine, fst: TermId, snd: TermId) -> TermId {
        engine.terms().app2(self.prod_rel, fst, snd)
    }

    pub fn sum(&self, engine: &Engine, left: TermId, right: TermId) -> TermId {
        engine.terms().app2(self.sum_rel, left, right)
    }

    pub fn list(&self, engine: &Engine, rel: TermId) -> TermId {
        engine.terms().app1(self.list_rel, rel)
    }
}

/// Relate two constructor applications through the scheme case that pairs
/// their constructors: one subgoal per field.
pub fn relator_intro(solver: &mut Solver<'_>, goal: &Goal) -> Result<Reduction, SolveError> {
    let Goal::Related { rel, left, right } = *goal else {
        return Err(solver.no_rule(goal));
    };
    let Relation::Named(head, args) = solver.view(rel) else {
        return Err(solver.no_rule(goal));
    };
    let scheme = solver.facts().scheme(head).ok_or_else(|| solver.no_rule(goal))?;
    let terms = solver.terms();
    let (Some((c1, xs)), Some((c2, ys))) = (
        terms.is_app(solver.walk(left)),
        terms.is_app(solver.walk(right)),
    ) else {
        return Err(solver.no_rule(goal));
    };
    let case = scheme
        .cases
        .iter()
        .find(|c| c.left == c1 && c.right == c2 && c.fields.len() == xs.len() && xs.len() == ys.len())
        .ok_or_else(|| solver.no_rule(goal))?;

    let whole = solver.resolve(rel);
    let mut subgoals = Vec::with_capacity(xs.len());
    for (i, field) in case.fields.iter().enumerate() {
        let field_rel = field_relation(*field, whole, &args).ok_or_else(|| solver.no_rule(goal))?;
        subgoals.push(Goal::related(field_rel, xs[i], ys[i]));
    }
    Ok(Reduction::to(subgoals))
}

#[cfg(test)]
#[path = "tests/relators.rs"]
mod tests;
