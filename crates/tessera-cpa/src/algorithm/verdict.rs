use std::fmt;

/// Lifecycle of a [`CpaAlgorithm`](crate::CpaAlgorithm).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    TargetFound,
    Exhausted,
    LimitReached,
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A target state is reachable in the abstraction.
    TargetFound,
    /// The waitlist emptied without reaching a target.
    Exhausted,
    /// The run stopped early; no verdict can be given yet.
    LimitReached(LimitReason),
}

impl Verdict {
    pub fn is_target_found(&self) -> bool {
        matches!(self, Verdict::TargetFound)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Verdict::Exhausted)
    }

    pub fn limit(&self) -> Option<LimitReason> {
        match self {
            Verdict::LimitReached(reason) => Some(*reason),
            _ => None,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        match self {
            Verdict::TargetFound => Phase::TargetFound,
            Verdict::Exhausted => Phase::Exhausted,
            Verdict::LimitReached(_) => Phase::LimitReached,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::TargetFound => write!(f, "target found"),
            Verdict::Exhausted => write!(f, "exhausted"),
            Verdict::LimitReached(reason) => write!(f, "limit reached ({reason})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitReason {
    /// The shutdown notifier was triggered.
    Cancelled,
    IterationBudget,
    TimeBudget,
    /// The waitlist emptied but some reached states were left unexpanded
    /// because they must be dumped.
    PrecisionLimit { dumped: usize },
    /// Precision adjustment asked the algorithm to yield.
    Yielded,
}

impl LimitReason {
    /// Whether condition adjustment may resume after this limit.
    pub fn is_adjustable(&self) -> bool {
        !matches!(self, LimitReason::Cancelled)
    }
}

impl fmt::Display for LimitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitReason::Cancelled => write!(f, "cancelled"),
            LimitReason::IterationBudget => write!(f, "iteration budget"),
            LimitReason::TimeBudget => write!(f, "time budget"),
            LimitReason::PrecisionLimit { dumped } => {
                write!(f, "precision limit, {dumped} states dumped")
            }
            LimitReason::Yielded => write!(f, "yielded"),
        }
    }
}
