use crate::term::{MatchArm, Term, TermId, TermStore};
use smallvec::SmallVec;

/// Position in the binding trail, used to undo bindings on backtrack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

/// A substitution from placeholder indices to terms with an undo trail.
///
/// Bindings are monotone: a placeholder is bound at most once between a
/// checkpoint and the matching rollback. Every binding is appended to the
/// trail, so rolling back is truncating the trail and clearing the entries
/// it names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subst {
    bindings: Vec<Option<TermId>>,
    trail: Vec<u32>,
}

impl Subst {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a placeholder to a term. Extends the substitution if needed.
    pub fn bind(&mut self, var: u32, term: TermId) {
        let idx = var as usize;
        if idx >= self.bindings.len() {
            self.bindings.resize(idx + 1, None);
        }
        debug_assert!(self.bindings[idx].is_none(), "placeholder ?{} rebound", var);
        self.bindings[idx] = Some(term);
        self.trail.push(var);
    }

    /// Get the binding for a placeholder, if any.
    pub fn get(&self, var: u32) -> Option<TermId> {
        self.bindings.get(var as usize).copied().flatten()
    }

    pub fn is_bound(&self, var: u32) -> bool {
        self.get(var).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    /// Number of bound placeholders.
    pub fn len(&self) -> usize {
        self.trail.len()
    }

    /// Iterator over (placeholder, term) pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, TermId)> + '_ {
        self.trail
            .iter()
            .filter_map(|&var| self.get(var).map(|t| (var, t)))
    }

    /// Mark the current trail position.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.trail.len())
    }

    /// Undo every binding made since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.trail.len() > checkpoint.0 {
            if let Some(var) = self.trail.pop() {
                self.bindings[var as usize] = None;
            }
        }
    }
}

/// Follow placeholder bindings until reaching an unbound placeholder or a
/// non-placeholder term. Binding chains are acyclic thanks to the occurs
/// check in unification.
pub fn walk(term: TermId, subst: &Subst, terms: &TermStore) -> TermId {
    let mut current = term;
    while let Some(idx) = terms.is_var(current) {
        match subst.get(idx) {
            Some(bound) => current = bound,
            None => break,
        }
    }
    current
}

/// Apply a substitution to a term, replacing every bound placeholder.
pub fn apply_subst(term: TermId, subst: &Subst, terms: &TermStore) -> TermId {
    if subst.is_empty() {
        return term;
    }
    let term = walk(term, subst, terms);
    match terms.resolve(term) {
        Some(Term::App(f, args)) if !args.is_empty() => {
            let new_args: SmallVec<[TermId; 4]> = args
                .iter()
                .map(|a| apply_subst(*a, subst, terms))
                .collect();
            if new_args == args {
                term
            } else {
                terms.app(f, new_args)
            }
        }
        Some(Term::Match(scrutinee, arms)) => {
            let scrutinee = apply_subst(scrutinee, subst, terms);
            let arms: SmallVec<[MatchArm; 2]> = arms
                .iter()
                .map(|arm| MatchArm {
                    body: apply_subst(arm.body, subst, terms),
                    ..*arm
                })
                .collect();
            terms.match_on(scrutinee, arms)
        }
        _ => term,
    }
}

#[cfg(test)]
#[path = "tests/subst.rs"]
mod tests;
