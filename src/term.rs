use crate::symbol::{FuncId, SymbolStore};
use hashbrown::HashMap;
use parking_lot::RwLock;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

/// Unique identifier for a term in the term store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// One branch of a match expression: `ctor x1 .. x_arity => body x1 .. x_arity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchArm {
    pub ctor: FuncId,
    pub arity: u32,
    pub body: TermId,
}

/// Terms are placeholders, curried applications or match expressions.
///
/// `App(h, [a1, .., an])` is the application `h a1 .. an`; with no arguments
/// it is the constant `h`. Its prefixes `h a1 .. ak` are `App(h, [a1..ak])`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A unification placeholder.
    Var(u32),
    /// Head symbol applied to arguments.
    App(FuncId, SmallVec<[TermId; 4]>),
    /// Case analysis on a scrutinee.
    Match(TermId, SmallVec<[MatchArm; 2]>),
}

/// Number of shards for hashcons maps (power of 2 for fast modulo).
const NUM_SHARDS: usize = 16;

/// Thread-safe term store with hashconsing.
///
/// Structurally equal terms get the same TermId, so syntactic equality of
/// fully resolved terms is an id comparison.
pub struct TermStore {
    nodes: RwLock<Vec<Term>>,
    shards: [RwLock<HashMap<Term, TermId>>; NUM_SHARDS],
    next_id: AtomicU32,
}

impl TermStore {
    pub fn new() -> Self {
        let shards = std::array::from_fn(|_| RwLock::new(HashMap::new()));
        Self {
            nodes: RwLock::new(Vec::new()),
            shards,
            next_id: AtomicU32::new(0),
        }
    }

    fn intern(&self, term: Term) -> TermId {
        let shard = &self.shards[Self::shard_index(&term)];

        {
            let map = shard.read();
            if let Some(&id) = map.get(&term) {
                return id;
            }
        }

        let mut map = shard.write();
        // Double-check after acquiring write lock
        if let Some(&id) = map.get(&term) {
            return id;
        }

        let id = TermId(self.next_id.fetch_add(1, Ordering::Relaxed));
        {
            let mut nodes = self.nodes.write();
            let idx = id.0 as usize;
            if nodes.len() <= idx {
                nodes.resize(idx + 1, Term::Var(0));
            }
            nodes[idx] = term.clone();
        }
        map.insert(term, id);
        id
    }

    /// Create a placeholder term.
    pub fn var(&self, index: u32) -> TermId {
        self.intern(Term::Var(index))
    }

    /// Create an application term.
    pub fn app(&self, func: FuncId, args: SmallVec<[TermId; 4]>) -> TermId {
        self.intern(Term::App(func, args))
    }

    /// Create a constant.
    pub fn app0(&self, func: FuncId) -> TermId {
        self.app(func, SmallVec::new())
    }

    pub fn app1(&self, func: FuncId, arg: TermId) -> TermId {
        self.app(func, smallvec::smallvec![arg])
    }

    pub fn app2(&self, func: FuncId, left: TermId, right: TermId) -> TermId {
        self.app(func, smallvec::smallvec![left, right])
    }

    /// Create a match expression.
    pub fn match_on(&self, scrutinee: TermId, arms: SmallVec<[MatchArm; 2]>) -> TermId {
        self.intern(Term::Match(scrutinee, arms))
    }

    /// Resolve a TermId to its term.
    pub fn resolve(&self, id: TermId) -> Option<Term> {
        let nodes = self.nodes.read();
        nodes.get(id.0 as usize).cloned()
    }

    /// Placeholder index, if `id` is a placeholder.
    pub fn is_var(&self, id: TermId) -> Option<u32> {
        match self.resolve(id)? {
            Term::Var(idx) => Some(idx),
            _ => None,
        }
    }

    /// Head and arguments, if `id` is an application.
    pub fn is_app(&self, id: TermId) -> Option<(FuncId, SmallVec<[TermId; 4]>)> {
        match self.resolve(id)? {
            Term::App(f, args) => Some((f, args)),
            _ => None,
        }
    }

    /// Scrutinee and arms, if `id` is a match expression.
    pub fn is_match(&self, id: TermId) -> Option<(TermId, SmallVec<[MatchArm; 2]>)> {
        match self.resolve(id)? {
            Term::Match(s, arms) => Some((s, arms)),
            _ => None,
        }
    }

    /// Apply `func` to further arguments by extending its spine.
    ///
    /// Only applications can be extended; a placeholder or match head yields
    /// `None` since this store has no representation for it.
    pub fn apply(&self, func: TermId, extra: &[TermId]) -> Option<TermId> {
        let (head, mut args) = self.is_app(func)?;
        args.extend_from_slice(extra);
        Some(self.app(head, args))
    }

    /// The prefix `h a1 .. ak` of an application `h a1 .. an`, for `k <= n`.
    pub fn prefix(&self, id: TermId, len: usize) -> Option<TermId> {
        let (head, args) = self.is_app(id)?;
        if len > args.len() {
            return None;
        }
        Some(self.app(head, SmallVec::from_slice(&args[..len])))
    }

    /// Largest placeholder index occurring in `id`.
    pub fn max_var(&self, id: TermId) -> Option<u32> {
        let mut stack: SmallVec<[TermId; 16]> = smallvec::smallvec![id];
        let mut max = None;
        while let Some(t) = stack.pop() {
            match self.resolve(t) {
                Some(Term::Var(idx)) => max = max.max(Some(idx)),
                Some(Term::App(_, args)) => stack.extend(args.iter().copied()),
                Some(Term::Match(s, arms)) => {
                    stack.push(s);
                    stack.extend(arms.iter().map(|arm| arm.body));
                }
                None => {}
            }
        }
        max
    }

    /// Shift every placeholder in `id` by `offset`.
    pub fn rename(&self, id: TermId, offset: u32) -> TermId {
        if offset == 0 {
            return id;
        }
        match self.resolve(id) {
            Some(Term::Var(idx)) => self.var(idx + offset),
            Some(Term::App(f, args)) => {
                if args.is_empty() {
                    return id;
                }
                let args = args.iter().map(|a| self.rename(*a, offset)).collect();
                self.app(f, args)
            }
            Some(Term::Match(s, arms)) => {
                let s = self.rename(s, offset);
                let arms = arms
                    .iter()
                    .map(|arm| MatchArm {
                        body: self.rename(arm.body, offset),
                        ..*arm
                    })
                    .collect();
                self.match_on(s, arms)
            }
            None => id,
        }
    }

    fn shard_index(term: &Term) -> usize {
        let mut hasher = FxHasher::default();
        term.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a term as an s-expression. Placeholders print as `?n`.
pub fn format_term(
    term: TermId,
    terms: &TermStore,
    symbols: &SymbolStore,
) -> Result<String, String> {
    fn name<'s>(func: FuncId, symbols: &'s SymbolStore) -> Result<&'s str, String> {
        symbols
            .resolve(func)
            .ok_or_else(|| format!("Unknown symbol for func id {:?}", func))
    }

    fn render(
        term: TermId,
        terms: &TermStore,
        symbols: &SymbolStore,
        out: &mut String,
    ) -> Result<(), String> {
        match terms.resolve(term) {
            Some(Term::Var(idx)) => {
                out.push('?');
                out.push_str(&idx.to_string());
                Ok(())
            }
            Some(Term::App(func, args)) => {
                let name = name(func, symbols)?;
                if args.is_empty() {
                    out.push_str(name);
                    return Ok(());
                }
                out.push('(');
                out.push_str(name);
                for arg in args.iter() {
                    out.push(' ');
                    render(*arg, terms, symbols, out)?;
                }
                out.push(')');
                Ok(())
            }
            Some(Term::Match(scrutinee, arms)) => {
                out.push_str("(match ");
                render(scrutinee, terms, symbols, out)?;
                for arm in arms.iter() {
                    out.push_str(" [");
                    out.push_str(name(arm.ctor, symbols)?);
                    out.push('/');
                    out.push_str(&arm.arity.to_string());
                    out.push_str(" => ");
                    render(arm.body, terms, symbols, out)?;
                    out.push(']');
                }
                out.push(')');
                Ok(())
            }
            None => Err(format!("Unknown term id {:?}", term)),
        }
    }

    let mut out = String::new();
    render(term, terms, symbols, &mut out)?;
    Ok(out)
}

#[cfg(test)]
#[path = "tests/term.rs"]
mod tests;
