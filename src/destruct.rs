//! Destructuring: relating two match expressions by first relating their
//! scrutinees and then splitting that relational fact into one obligation
//! per aligned pair of branches.

use crate::error::SolveError;
use crate::goal::Goal;
use crate::proof::Proof;
use crate::relation::Relation;
use crate::rules::{Emit, Reduction};
use crate::solver::{Hypothesis, Solver};
use crate::symbol::FuncId;
use crate::term::{MatchArm, TermId, TermStore};
use smallvec::SmallVec;

/// Relation between the i-th fields of an aligned constructor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRel {
    /// The combinator's n-th argument, e.g. `R` in `option_rel R`.
    Arg(usize),
    /// A fixed relation term.
    Fixed(TermId),
    /// The relator itself, for recursive types such as lists.
    Recursive,
}

/// A left constructor, the right constructor it is related to, and how their
/// fields are related.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasePair {
    pub left: FuncId,
    pub right: FuncId,
    pub fields: SmallVec<[FieldRel; 4]>,
}

/// How a relator's related values line up constructor by constructor.
///
/// Library relators register one; the `option_rel R` scheme has the cases
/// `None ~ None` and `Some x ~ Some y` with `R x y`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestructScheme {
    pub cases: Vec<CasePair>,
}

impl DestructScheme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case(mut self, left: FuncId, right: FuncId, fields: &[FieldRel]) -> Self {
        self.cases.push(CasePair {
            left,
            right,
            fields: SmallVec::from_slice(fields),
        });
        self
    }

    /// The case whose left constructor is `ctor`.
    pub fn for_left(&self, ctor: FuncId) -> Option<&CasePair> {
        self.cases.iter().find(|c| c.left == ctor)
    }

    /// The case whose right constructor is `ctor`.
    pub fn for_right(&self, ctor: FuncId) -> Option<&CasePair> {
        self.cases.iter().find(|c| c.right == ctor)
    }
}

/// The relation a field relation denotes inside `whole`, a combinator
/// applied to `args`.
pub fn field_relation(field: FieldRel, whole: TermId, args: &[TermId]) -> Option<TermId> {
    match field {
        FieldRel::Arg(i) => args.get(i).copied(),
        FieldRel::Fixed(rel) => Some(rel),
        FieldRel::Recursive => Some(whole),
    }
}

/// The branch body applied to constructor fields.
pub(crate) fn apply_arm(body: TermId, fields: &[TermId], terms: &TermStore) -> Option<TermId> {
    if fields.is_empty() {
        Some(body)
    } else {
        terms.apply(body, fields)
    }
}

fn arm_for(arms: &[MatchArm], ctor: FuncId) -> Option<MatchArm> {
    arms.iter().find(|a| a.ctor == ctor).copied()
}

/// One obligation produced by a case split.
struct Case {
    hypotheses: Vec<Hypothesis>,
    goal: Goal,
}

/// `rel (match s1 ..) (match s2 ..)`: relate the scrutinees under a fresh
/// relation placeholder, then split. Each proof of the scrutinee relation
/// gives its own split.
pub(crate) fn destructure<'e>(
    solver: &mut Solver<'e>,
    goal: &Goal,
    emit: &mut Emit<'_, 'e>,
) -> Result<(), SolveError> {
    let Goal::Related { rel, left, right } = *goal else {
        return Err(solver.no_rule(goal));
    };
    let (s1, arms1) = solver
        .terms()
        .is_match(solver.walk(left))
        .ok_or_else(|| solver.no_rule(goal))?;
    let (s2, arms2) = solver
        .terms()
        .is_match(solver.walk(right))
        .ok_or_else(|| solver.no_rule(goal))?;

    let scrutinee_rel = solver.fresh_var();
    let scrutinees = Goal::related(scrutinee_rel, s1, s2);
    solver.solve_goal(&scrutinees, &mut |s: &mut Solver<'e>, scrutinee_proof: Proof| {
        let cases = split(s, rel, scrutinee_rel, &arms1, &arms2, goal)?;
        solve_cases(s, &cases, vec![scrutinee_proof], &mut *emit)
    })
}

/// Prove the cases in order, each under its own hypotheses.
fn solve_cases<'e>(
    solver: &mut Solver<'e>,
    cases: &[Case],
    done: Vec<Proof>,
    emit: &mut Emit<'_, 'e>,
) -> Result<(), SolveError> {
    let Some((case, rest)) = cases.split_first() else {
        let mut reduction = Reduction::closed();
        reduction.premises = done;
        return emit(solver, reduction);
    };
    let hypotheses = case.hypotheses.iter().copied();
    solver.solve_assuming(hypotheses, &case.goal, &mut |s: &mut Solver<'e>, proof: Proof| {
        let mut done = done.clone();
        done.push(proof);
        solve_cases(s, rest, done, &mut *emit)
    })
}

fn split(
    solver: &mut Solver<'_>,
    rel: TermId,
    scrutinee_rel: TermId,
    arms1: &[MatchArm],
    arms2: &[MatchArm],
    goal: &Goal,
) -> Result<Vec<Case>, SolveError> {
    let view = solver.view(scrutinee_rel);
    let facts = solver.facts();

    let (head, args, whole, flipped) = match &view {
        Relation::Equality => return aligned_split(solver, rel, arms1, arms2, goal),
        Relation::Named(head, args) => (*head, args.clone(), solver.resolve(scrutinee_rel), false),
        Relation::Flip(inner) => match solver.view(*inner) {
            Relation::Named(head, args) => (head, args, solver.resolve(*inner), true),
            _ => return Ok(all_pairs_split(solver, rel, arms1, arms2)),
        },
        _ => return Ok(all_pairs_split(solver, rel, arms1, arms2)),
    };
    let Some(scheme) = facts.scheme(head) else {
        return Ok(all_pairs_split(solver, rel, arms1, arms2));
    };

    let mut cases = Vec::with_capacity(scheme.cases.len());
    for case in &scheme.cases {
        // Under a flip the scheme's right constructor sits on our left.
        let (ctor1, ctor2) = if flipped {
            (case.right, case.left)
        } else {
            (case.left, case.right)
        };
        let (Some(arm1), Some(arm2)) = (arm_for(arms1, ctor1), arm_for(arms2, ctor2)) else {
            return Err(solver.no_rule(goal));
        };
        let arity = case.fields.len();
        if arm1.arity as usize != arity || arm2.arity as usize != arity {
            return Err(solver.no_rule(goal));
        }

        let xs = solver.fresh_constants("x", arity);
        let ys = solver.fresh_constants("y", arity);
        let mut hypotheses = Vec::with_capacity(arity);
        for (i, field) in case.fields.iter().enumerate() {
            let field_rel = field_relation(*field, whole, &args).ok_or_else(|| solver.no_rule(goal))?;
            let (l, r) = if flipped { (ys[i], xs[i]) } else { (xs[i], ys[i]) };
            hypotheses.push(Hypothesis {
                rel: field_rel,
                left: l,
                right: r,
                witness: solver.fresh_constant("h"),
            });
        }
        let terms = solver.terms();
        let left = apply_arm(arm1.body, &xs, terms).ok_or_else(|| solver.no_rule(goal))?;
        let right = apply_arm(arm2.body, &ys, terms).ok_or_else(|| solver.no_rule(goal))?;
        cases.push(Case {
            hypotheses,
            goal: Goal::related(rel, left, right),
        });
    }
    Ok(cases)
}

/// Equal scrutinees take the same branch with the same fields.
fn aligned_split(
    solver: &mut Solver<'_>,
    rel: TermId,
    arms1: &[MatchArm],
    arms2: &[MatchArm],
    goal: &Goal,
) -> Result<Vec<Case>, SolveError> {
    let mut cases = Vec::with_capacity(arms1.len());
    for arm1 in arms1 {
        let arm2 = arm_for(arms2, arm1.ctor)
            .filter(|a| a.arity == arm1.arity)
            .ok_or_else(|| solver.no_rule(goal))?;
        let xs = solver.fresh_constants("x", arm1.arity as usize);
        let terms = solver.terms();
        let left = apply_arm(arm1.body, &xs, terms).ok_or_else(|| solver.no_rule(goal))?;
        let right = apply_arm(arm2.body, &xs, terms).ok_or_else(|| solver.no_rule(goal))?;
        cases.push(Case {
            hypotheses: Vec::new(),
            goal: Goal::related(rel, left, right),
        });
    }
    Ok(cases)
}

/// Structural case analysis on each side independently.
fn all_pairs_split(
    solver: &mut Solver<'_>,
    rel: TermId,
    arms1: &[MatchArm],
    arms2: &[MatchArm],
) -> Vec<Case> {
    let mut cases = Vec::with_capacity(arms1.len() * arms2.len());
    for arm1 in arms1 {
        for arm2 in arms2 {
            let xs = solver.fresh_constants("x", arm1.arity as usize);
            let ys = solver.fresh_constants("y", arm2.arity as usize);
            let terms = solver.terms();
            if let (Some(left), Some(right)) = (
                apply_arm(arm1.body, &xs, terms),
                apply_arm(arm2.body, &ys, terms),
            ) {
                cases.push(Case {
                    hypotheses: Vec::new(),
                    goal: Goal::related(rel, left, right),
                });
            }
        }
    }
    cases
}

/// Reduce a match on a constructor application to the selected branch.
pub(crate) fn reduce_match(solver: &mut Solver<'_>, goal: &Goal) -> Result<Reduction, SolveError> {
    let Goal::Related { rel, left, right } = *goal else {
        return Err(solver.no_rule(goal));
    };
    let left2 = iota(solver, left);
    let right2 = iota(solver, right);
    if left2.is_none() && right2.is_none() {
        return Err(solver.no_rule(goal));
    }
    Ok(Reduction::to(vec![Goal::related(
        rel,
        left2.unwrap_or(left),
        right2.unwrap_or(right),
    )]))
}

fn iota(solver: &Solver<'_>, term: TermId) -> Option<TermId> {
    let terms = solver.terms();
    let (scrutinee, arms) = terms.is_match(solver.walk(term))?;
    let (ctor, fields) = terms.is_app(solver.walk(scrutinee))?;
    let arm = arm_for(&arms, ctor).filter(|a| a.arity as usize == fields.len())?;
    apply_arm(arm.body, &fields, terms)
}

#[cfg(test)]
#[path = "tests/destruct.rs"]
mod tests;
