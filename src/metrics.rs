//! Per-solve search statistics.
//!
//! Each solve owns its counters, so unlike a process-wide collector these are
//! plain integers and always available, not only under the `tracing`
//! feature.
//!
//! ```rust,ignore
//! let solution = engine.solve(&goal);
//! println!("{}", solution.stats);
//! ```

use std::fmt;

/// Counters collected while solving one top-level goal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Step rule applications attempted (this is what `fuel` bounds).
    pub steps: u64,
    /// Rule applications undone after failing.
    pub backtracks: u64,
    /// Unification attempts.
    pub unifications: u64,
    /// Registry lookups made by candidate selection, one per prefix length
    /// examined.
    pub candidate_probes: u64,
    /// Obligations handed to the delay accumulator.
    pub deferrals: u64,
    /// Deepest goal nesting reached.
    pub max_depth: usize,
}

impl SolveStats {
    /// Fraction of rule attempts that were not undone.
    pub fn success_rate(&self) -> f64 {
        if self.steps == 0 {
            1.0
        } else {
            (self.steps - self.backtracks) as f64 / self.steps as f64
        }
    }
}

impl fmt::Display for SolveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Solve Statistics ===")?;
        writeln!(f, "Steps:            {:>10}", self.steps)?;
        writeln!(
            f,
            "Backtracks:       {:>10} ({:.1}% kept)",
            self.backtracks,
            self.success_rate() * 100.0
        )?;
        writeln!(f, "Unifications:     {:>10}", self.unifications)?;
        writeln!(f, "Candidate probes: {:>10}", self.candidate_probes)?;
        writeln!(f, "Deferrals:        {:>10}", self.deferrals)?;
        write!(f, "Max depth:        {:>10}", self.max_depth)
    }
}
