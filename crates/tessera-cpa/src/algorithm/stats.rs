use std::time::Duration;

use crate::Verdict;

/// Counters accumulated over every run of one algorithm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlgorithmStatistics {
    pub runs: usize,
    /// States popped from the waitlist.
    pub iterations: usize,
    /// Successors produced by the transfer relation.
    pub successors: usize,
    /// Successors dropped by precision adjustment.
    pub discarded: usize,
    pub merged: usize,
    pub covered: usize,
    pub added: usize,
    pub targets: usize,
    /// Popped states left unexpanded because they must be dumped.
    pub dumped: usize,
    pub elapsed: Duration,
}

impl AlgorithmStatistics {
    pub(crate) fn log(&self, verdict: &Verdict) {
        tracing::info!(
            %verdict,
            runs = self.runs,
            iterations = self.iterations,
            successors = self.successors,
            discarded = self.discarded,
            merged = self.merged,
            covered = self.covered,
            added = self.added,
            targets = self.targets,
            dumped = self.dumped,
            elapsed = ?self.elapsed,
            "analysis run finished"
        );
    }
}
