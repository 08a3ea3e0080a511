use crate::engine::Engine;
use crate::goal::Goal;
use crate::solver::Solver;
use crate::symbol::SymbolStore;
use crate::term::TermStore;

pub(crate) fn setup() -> (SymbolStore, TermStore) {
    (SymbolStore::new(), TermStore::new())
}

/// Run `f` inside a solver context for `engine`, with placeholders above
/// those of `goal` free for the solver.
pub(crate) fn with_solver<T>(engine: &Engine, goal: &Goal, f: impl FnOnce(&mut Solver<'_>) -> T) -> T {
    let first_free = goal.max_var(engine.terms()).map_or(0, |m| m + 1);
    let mut solver = Solver::new(engine, first_free);
    f(&mut solver)
}
