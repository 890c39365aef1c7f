use tracing::{debug, info, trace, warn};

use crate::arg::IdSet;
use crate::{
    AbstractState, ConfigurableProgramAnalysis, CpaAlgorithm, CpaError, Exploration,
    ExplorationOf, LimitReason, StateId, Verdict,
};

/// What [`prune_flagged`] did to an exploration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneSummary {
    /// Reached states the predicate selected.
    pub flagged: Vec<StateId>,
    /// Every node removed, flagged states and stranded descendants included.
    pub removed: Vec<StateId>,
    /// Surviving states put back on the waitlist.
    pub requeued: Vec<StateId>,
    /// The root was flagged and everything was dropped.
    pub cleared: bool,
}

impl PruneSummary {
    pub fn is_noop(&self) -> bool {
        self.flagged.is_empty()
    }
}

/// Remove every reached state selected by `flagged` and re-queue the
/// surviving parents so they are expanded again.
///
/// Descendants that were only reachable through removed states go too, as do
/// covered leaves whose coverer disappears. If the root is flagged the whole
/// exploration is cleared instead. The full plan is computed before anything
/// is mutated.
pub fn prune_flagged<S, P>(
    exploration: &mut Exploration<S, P>,
    mut flagged: impl FnMut(&S) -> bool,
) -> PruneSummary
where
    S: AbstractState + Clone,
{
    let marked: Vec<StateId> = exploration
        .reached()
        .iter()
        .filter(|(_, entry)| flagged(&entry.state))
        .map(|(id, _)| id)
        .collect();
    if marked.is_empty() {
        return PruneSummary::default();
    }

    if exploration.root().is_some_and(|root| marked.contains(&root)) {
        let removed: Vec<StateId> = exploration.arg().iter().map(|(id, _)| id).collect();
        debug!(
            flagged = marked.len(),
            removed = removed.len(),
            "root flagged, clearing exploration"
        );
        exploration.clear();
        return PruneSummary {
            flagged: marked,
            removed,
            requeued: Vec::new(),
            cleared: true,
        };
    }

    let (removal, requeue) = plan(exploration, &marked);
    for &id in &removal {
        exploration.remove(id);
    }
    for &id in &requeue {
        exploration.reached_mut().re_add_to_waitlist(id);
    }
    debug!(
        flagged = marked.len(),
        removed = removal.len(),
        requeued = requeue.len(),
        "pruned exploration"
    );
    PruneSummary {
        flagged: marked,
        removed: removal.into_iter().collect(),
        requeued: requeue.into_iter().collect(),
        cleared: false,
    }
}

fn plan<S, P>(exploration: &Exploration<S, P>, marked: &[StateId]) -> (IdSet, IdSet) {
    let arg = exploration.arg();
    let reached = exploration.reached();
    let mut removal: IdSet = marked.iter().copied().collect();
    let mut requeue = IdSet::default();

    let mut cursor = 0;
    while let Some(&node) = removal.get_index(cursor) {
        cursor += 1;
        let children: Vec<StateId> = arg.children(node).collect();
        for child in children {
            if removal.contains(&child) {
                continue;
            }
            let stranded = arg
                .parents(child)
                .all(|parent| parent == child || removal.contains(&parent));
            if stranded {
                removal.insert(child);
            }
        }
        let covered: Vec<StateId> = arg
            .node(node)
            .map(|n| n.covering().collect())
            .unwrap_or_default();
        for leaf in covered {
            if reached.contains(leaf) {
                requeue.insert(leaf);
            } else {
                removal.insert(leaf);
            }
        }
        for parent in exploration.covered_parents(node) {
            if reached.contains(parent) {
                requeue.insert(parent);
            }
        }
    }

    for &node in &removal {
        for parent in arg.parents(node) {
            if reached.contains(parent) {
                requeue.insert(parent);
            }
        }
    }
    requeue.retain(|id| !removal.contains(id));
    (removal, requeue)
}

/// Outer loop that relaxes precision whenever a run hits a limit and
/// resumes the same exploration.
pub struct ConditionAdjustment<C: ConfigurableProgramAnalysis> {
    algorithm: CpaAlgorithm<C>,
    max_rounds: usize,
    rounds: usize,
}

impl<C: ConfigurableProgramAnalysis> ConditionAdjustment<C> {
    pub fn new(algorithm: CpaAlgorithm<C>) -> Self {
        ConditionAdjustment {
            algorithm,
            max_rounds: 16,
            rounds: 0,
        }
    }

    /// Give up after `max_rounds` adjustments.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn algorithm(&self) -> &CpaAlgorithm<C> {
        &self.algorithm
    }

    pub fn algorithm_mut(&mut self) -> &mut CpaAlgorithm<C> {
        &mut self.algorithm
    }

    pub fn into_inner(self) -> CpaAlgorithm<C> {
        self.algorithm
    }

    /// Adjustment rounds in which some precision changed.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Run, adjust and resume until a verdict is reached, the analyses stop
    /// relaxing, cancellation is requested or the round budget runs out.
    ///
    /// A yielded run is resumed whether or not anything was relaxed; only
    /// rounds that changed some precision count against the budget.
    pub fn run(&mut self, exploration: &mut ExplorationOf<C>) -> Result<Verdict, CpaError> {
        loop {
            let verdict = self.algorithm.run(exploration)?;
            let Verdict::LimitReached(reason) = verdict else {
                return Ok(verdict);
            };
            if !reason.is_adjustable() {
                return Ok(verdict);
            }
            let changed = if self.rounds < self.max_rounds {
                self.adjust(exploration)?
            } else {
                false
            };
            if changed {
                continue;
            }
            if reason == LimitReason::Yielded {
                trace!("resuming after yield");
                continue;
            }
            if self.rounds >= self.max_rounds {
                warn!(rounds = self.rounds, %reason, "adjustment round budget exhausted");
            } else {
                info!(%reason, "no analysis relaxed its precision");
            }
            return Ok(verdict);
        }
    }

    /// One adjustment step: relax precision and, if anything changed, prune
    /// the reached set. A cleared exploration is re-seeded at the entry.
    /// Returns whether any precision changed.
    ///
    /// If relaxing fails the exploration is left untouched.
    pub fn adjust(&mut self, exploration: &mut ExplorationOf<C>) -> Result<bool, CpaError> {
        if !self.algorithm.cpa_mut().adjust_precision()? {
            return Ok(false);
        }
        self.rounds += 1;
        let summary = self.algorithm.cpa().adjust_reached_set(exploration)?;
        info!(
            round = self.rounds,
            removed = summary.removed.len(),
            requeued = summary.requeued.len(),
            cleared = summary.cleared,
            "adjusted reached set"
        );
        if exploration.is_empty() {
            exploration.clear();
            self.algorithm.seed(exploration)?;
        }
        Ok(true)
    }
}
