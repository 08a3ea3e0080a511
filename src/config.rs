/// Search limits and policy for every solve run by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum nesting of goals. Deeper branches fail with `DepthExceeded`
    /// and the solver backtracks.
    pub max_depth: usize,
    /// Maximum number of rule applications per solve. Running out aborts the
    /// whole solve with `DepthExceeded`.
    pub fuel: u64,
    /// Defer goals no rule could prove instead of failing them.
    pub defer_unsolved: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            fuel: 100_000,
            defer_unsolved: false,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn fuel(mut self, fuel: u64) -> Self {
        self.fuel = fuel;
        self
    }

    pub fn defer_unsolved(mut self, defer: bool) -> Self {
        self.defer_unsolved = defer;
        self
    }
}
