use crate::subst::{walk, Subst};
use crate::term::{Term, TermId, TermStore};
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Unify two terms in place, extending `subst` to a most general unifier.
///
/// On failure every binding made by this call is undone and `false` is
/// returned, so callers never observe a partial unifier.
///
/// Uses an explicit worklist and performs the occurs check.
pub fn unify(t1: TermId, t2: TermId, subst: &mut Subst, terms: &TermStore) -> bool {
    let checkpoint = subst.checkpoint();
    let mut worklist: SmallVec<[(TermId, TermId); 32]> = SmallVec::new();
    worklist.push((t1, t2));

    while let Some((a, b)) = worklist.pop() {
        let a = walk(a, subst, terms);
        let b = walk(b, subst, terms);
        if a == b {
            continue;
        }

        let ok = match (terms.resolve(a), terms.resolve(b)) {
            (Some(Term::Var(idx_a)), Some(Term::Var(idx_b))) => {
                // Bind the younger placeholder to the older one.
                if idx_a < idx_b {
                    subst.bind(idx_b, a);
                } else {
                    subst.bind(idx_a, b);
                }
                true
            }
            (Some(Term::Var(idx)), Some(_)) => bind_checked(idx, b, subst, terms),
            (Some(_), Some(Term::Var(idx))) => bind_checked(idx, a, subst, terms),
            (Some(Term::App(f1, args1)), Some(Term::App(f2, args2))) => {
                if f1 == f2 && args1.len() == args2.len() {
                    worklist.extend(args1.iter().copied().zip(args2.iter().copied()));
                    true
                } else {
                    #[cfg(feature = "tracing")]
                    trace!("unify_head_mismatch");
                    false
                }
            }
            (Some(Term::Match(s1, arms1)), Some(Term::Match(s2, arms2))) => {
                let aligned = arms1.len() == arms2.len()
                    && arms1
                        .iter()
                        .zip(arms2.iter())
                        .all(|(x, y)| x.ctor == y.ctor && x.arity == y.arity);
                if aligned {
                    worklist.push((s1, s2));
                    worklist.extend(arms1.iter().zip(arms2.iter()).map(|(x, y)| (x.body, y.body)));
                }
                aligned
            }
            _ => false,
        };

        if !ok {
            subst.rollback(checkpoint);
            return false;
        }
    }

    true
}

fn bind_checked(var: u32, term: TermId, subst: &mut Subst, terms: &TermStore) -> bool {
    if occurs(var, term, subst, terms) {
        #[cfg(feature = "tracing")]
        trace!(var, "unify_occurs_check_failed");
        return false;
    }
    subst.bind(var, term);
    true
}

/// Occurs check: does placeholder `var` occur in `term` under `subst`?
pub fn occurs(var: u32, term: TermId, subst: &Subst, terms: &TermStore) -> bool {
    let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
    stack.push(term);

    while let Some(t) = stack.pop() {
        match terms.resolve(walk(t, subst, terms)) {
            Some(Term::Var(idx)) if idx == var => return true,
            Some(Term::App(_, args)) => stack.extend(args.iter().copied()),
            Some(Term::Match(s, arms)) => {
                stack.push(s);
                stack.extend(arms.iter().map(|arm| arm.body));
            }
            _ => {}
        }
    }

    false
}

#[cfg(test)]
#[path = "tests/unify.rs"]
mod tests;
