use std::time::Duration;

use crate::TraversalOrder;

/// Knobs of a [`CpaAlgorithm`](crate::CpaAlgorithm) run.
///
/// Budgets apply to each call of `run` separately.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AlgorithmConfig {
    /// Order of a freshly created waitlist.
    #[builder(default)]
    pub traversal_order: TraversalOrder,
    /// Return as soon as a target state is accepted.
    #[builder(default = true)]
    pub stop_after_target: bool,
    /// Record covered successors as ARG leaves. Coverage is tracked either
    /// way, so pruning a coverer always re-queues the covered parents.
    #[builder(default = true)]
    pub keep_covered_in_arg: bool,
    /// Maximum number of expanded states per run.
    pub max_iterations: Option<usize>,
    /// Wall-clock budget per run.
    pub time_limit: Option<Duration>,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
