use thiserror::Error;

/// Why a goal, a reification or a transport could not be completed.
///
/// Every kind is locally recoverable: the solver backtracks on it and only
/// reports the most specific one once all alternatives are exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("no fact or prefix found for {0}")]
    NoCandidate(String),
    #[error("no step rule applies to {0}")]
    NoMatchingRule(String),
    #[error("candidate found but no subrel path bridges it to {0}")]
    UnbridgeableGap(String),
    #[error("delay witness is not a conjunction terminated by unit")]
    ImproperTerminator,
    #[error("search budget exhausted after {steps} steps at depth {depth}")]
    DepthExceeded { depth: usize, steps: u64 },
    #[error("unknown fact #{0}")]
    UnknownFact(usize),
    #[error("cannot transport: {0}")]
    NotTransportable(String),
}

impl SolveError {
    /// How informative the error is when several alternatives failed.
    pub(crate) fn specificity(&self) -> u8 {
        match self {
            SolveError::NoMatchingRule(_) => 0,
            SolveError::NoCandidate(_) => 1,
            SolveError::UnbridgeableGap(_) => 2,
            SolveError::DepthExceeded { .. } => 3,
            SolveError::ImproperTerminator
            | SolveError::UnknownFact(_)
            | SolveError::NotTransportable(_) => 4,
        }
    }

    /// `self` or `prev`, whichever says more. Ties go to `self`.
    pub(crate) fn most_specific(self, prev: Option<SolveError>) -> SolveError {
        match prev {
            Some(prev) if prev.specificity() > self.specificity() => prev,
            _ => self,
        }
    }
}
