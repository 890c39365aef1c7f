//! The reachability loop.
//!
//! [`CpaAlgorithm::run`] pops frontier states, computes their successors
//! along every outgoing edge, and merges, covers or accepts each successor
//! until the waitlist empties, a target is found, or a limit is hit. Runs are
//! resumable: the same exploration can be passed to `run` again after a
//! limit, which is what [`ConditionAdjustment`](crate::ConditionAdjustment)
//! does.

mod config;
mod shutdown;
mod stats;
mod verdict;

use std::sync::Arc;
use std::time::Instant;

use smallvec::{SmallVec, smallvec};
use tessera_cfa::Cfa;
use tracing::{debug, info, trace, warn};

use crate::operator::covering_index;
use crate::{
    AbstractState, Action, ConfigurableProgramAnalysis, CpaError, Exploration, StateId,
    TransferRelation, partition_of,
};

pub use config::AlgorithmConfig;
pub use shutdown::ShutdownNotifier;
pub use stats::AlgorithmStatistics;
pub use verdict::{LimitReason, Phase, Verdict};

/// The exploration type driven by an algorithm over `C`.
pub type ExplorationOf<C> = Exploration<
    <C as ConfigurableProgramAnalysis>::State,
    <C as ConfigurableProgramAnalysis>::Precision,
>;

/// Outcome of a single [`CpaAlgorithm::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The waitlist was empty.
    Idle,
    Expanded(Expansion),
    /// Cancellation was observed mid-expansion; the state was re-queued.
    Interrupted(LimitReason),
}

/// What happened while expanding one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// The expanded state. A merge into the state being expanded replaces
    /// the popped id with the merged one.
    pub state: StateId,
    /// Successors accepted into the reached set.
    pub added: SmallVec<[StateId; 4]>,
    /// Reached states created by merging.
    pub merged: SmallVec<[StateId; 2]>,
    pub targets: SmallVec<[StateId; 2]>,
    /// Precision adjustment answered [`Action::Break`].
    pub yielded: bool,
    /// The state was not expanded because it must be dumped.
    pub dumped: bool,
}

impl Expansion {
    fn new(state: StateId) -> Self {
        Expansion {
            state,
            added: SmallVec::new(),
            merged: SmallVec::new(),
            targets: SmallVec::new(),
            yielded: false,
            dumped: false,
        }
    }
}

/// Drives one [`ConfigurableProgramAnalysis`] over a control-flow automaton.
pub struct CpaAlgorithm<C: ConfigurableProgramAnalysis> {
    cpa: C,
    cfa: Arc<Cfa>,
    config: AlgorithmConfig,
    shutdown: ShutdownNotifier,
    phase: Phase,
    statistics: AlgorithmStatistics,
}

impl<C: ConfigurableProgramAnalysis> CpaAlgorithm<C> {
    pub fn new(cpa: C, cfa: Arc<Cfa>) -> Self {
        CpaAlgorithm {
            cpa,
            cfa,
            config: AlgorithmConfig::default(),
            shutdown: ShutdownNotifier::default(),
            phase: Phase::Idle,
            statistics: AlgorithmStatistics::default(),
        }
    }

    pub fn with_config(mut self, config: AlgorithmConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a cancellation flag with the host.
    pub fn with_shutdown(mut self, shutdown: ShutdownNotifier) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn cpa(&self) -> &C {
        &self.cpa
    }

    pub fn cpa_mut(&mut self) -> &mut C {
        &mut self.cpa
    }

    pub fn cfa(&self) -> &Arc<Cfa> {
        &self.cfa
    }

    pub fn config(&self) -> &AlgorithmConfig {
        &self.config
    }

    pub fn shutdown(&self) -> &ShutdownNotifier {
        &self.shutdown
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn statistics(&self) -> &AlgorithmStatistics {
        &self.statistics
    }

    /// A new exploration seeded with the initial state at the CFA entry.
    pub fn initial_exploration(&self) -> Result<ExplorationOf<C>, CpaError> {
        let mut exploration = Exploration::new(self.config.traversal_order);
        self.seed(&mut exploration)?;
        Ok(exploration)
    }

    /// Seed an empty exploration with the initial state at the CFA entry.
    pub fn seed(&self, exploration: &mut ExplorationOf<C>) -> Result<StateId, CpaError> {
        let entry = self.cfa.entry();
        let state = self.cpa.initial_state(entry)?;
        let precision = self.cpa.initial_precision(entry)?;
        if state.location().is_none() {
            return Err(CpaError::configuration(format!(
                "initial state of `{}` carries no program location",
                self.cpa.name()
            )));
        }
        let id = exploration.seed(state, precision);
        debug!(root = %id, %entry, "seeded exploration");
        Ok(id)
    }

    /// Explore until the waitlist empties, a target is found or a limit is
    /// hit. On error the state under expansion is re-queued, so the
    /// exploration stays consistent.
    pub fn run(&mut self, exploration: &mut ExplorationOf<C>) -> Result<Verdict, CpaError> {
        let started = Instant::now();
        self.phase = Phase::Running;
        self.statistics.runs += 1;

        let result = self.explore(exploration, started);
        self.statistics.elapsed += started.elapsed();
        match &result {
            Ok(verdict) => {
                self.phase = verdict.phase();
                self.statistics.log(verdict);
            }
            Err(error) => {
                self.phase = Phase::Idle;
                warn!(%error, "analysis run aborted");
            }
        }
        result
    }

    /// Pop and expand a single state.
    pub fn step(&mut self, exploration: &mut ExplorationOf<C>) -> Result<Step, CpaError> {
        let Some(id) = exploration.reached_mut().pop() else {
            return Ok(Step::Idle);
        };
        self.statistics.iterations += 1;
        let (state, precision) = match exploration.reached().get(id) {
            Some(entry) => (entry.state.clone(), entry.precision.clone()),
            None => unreachable!("popped state {id} is not reached"),
        };

        let mut expansion = Expansion::new(id);
        if state.must_dump() {
            self.statistics.dumped += 1;
            expansion.dumped = true;
            debug!(state = %id, reason = ?state.avoidance_reason(), "not expanding dumped state");
            return Ok(Step::Expanded(expansion));
        }

        match self.expand(exploration, &state, &precision, &mut expansion) {
            Ok(None) => Ok(Step::Expanded(expansion)),
            Ok(Some(reason)) => Ok(Step::Interrupted(reason)),
            Err(error) => {
                if exploration.reached().contains(expansion.state) {
                    exploration.reached_mut().re_add_to_waitlist(expansion.state);
                }
                Err(error)
            }
        }
    }

    fn explore(
        &mut self,
        exploration: &mut ExplorationOf<C>,
        started: Instant,
    ) -> Result<Verdict, CpaError> {
        if self.config.stop_after_target {
            let root_is_target = exploration
                .root()
                .and_then(|root| exploration.reached().state(root))
                .is_some_and(AbstractState::is_target);
            if root_is_target {
                info!("initial state is already a target");
                return Ok(Verdict::TargetFound);
            }
        }

        let mut iterations = 0usize;
        while exploration.reached().has_waiting_state() {
            if self.shutdown.is_requested() {
                debug!("cancellation requested");
                return Ok(Verdict::LimitReached(LimitReason::Cancelled));
            }
            if self.config.max_iterations.is_some_and(|max| iterations >= max) {
                return Ok(Verdict::LimitReached(LimitReason::IterationBudget));
            }
            if self
                .config
                .time_limit
                .is_some_and(|limit| started.elapsed() >= limit)
            {
                return Ok(Verdict::LimitReached(LimitReason::TimeBudget));
            }

            match self.step(exploration)? {
                Step::Idle => break,
                Step::Interrupted(reason) => return Ok(Verdict::LimitReached(reason)),
                Step::Expanded(expansion) => {
                    iterations += 1;
                    if !expansion.targets.is_empty() && self.config.stop_after_target {
                        return Ok(Verdict::TargetFound);
                    }
                    if expansion.yielded {
                        return Ok(Verdict::LimitReached(LimitReason::Yielded));
                    }
                }
            }
        }

        if exploration.targets().next().is_some() {
            return Ok(Verdict::TargetFound);
        }
        let dumped = exploration
            .reached()
            .states()
            .filter(|state| state.must_dump())
            .count();
        if dumped > 0 {
            return Ok(Verdict::LimitReached(LimitReason::PrecisionLimit { dumped }));
        }
        Ok(Verdict::Exhausted)
    }

    /// Returns the limit that interrupted the expansion, if any.
    fn expand(
        &mut self,
        exploration: &mut ExplorationOf<C>,
        state: &C::State,
        precision: &C::Precision,
        expansion: &mut Expansion,
    ) -> Result<Option<LimitReason>, CpaError> {
        let Some(location) = state.location() else {
            return Err(CpaError::configuration(format!(
                "state {} of `{}` carries no program location",
                expansion.state,
                self.cpa.name()
            )));
        };
        let cfa = Arc::clone(&self.cfa);
        let edges = cfa.outgoing(location);
        trace!(state = %expansion.state, %location, edges = edges.len(), "expanding");

        for (edge_index, edge) in edges.iter().enumerate() {
            if self.shutdown.is_requested() {
                exploration.reached_mut().re_add_to_waitlist(expansion.state);
                return Ok(Some(LimitReason::Cancelled));
            }

            let successors = self
                .cpa
                .transfer_relation()
                .successors(state, precision, edge)?;
            let count = successors.len();
            self.statistics.successors += count;
            trace!(%edge, successors = count, "computed successors");

            for (index, successor) in successors.into_iter().enumerate() {
                let adjusted =
                    self.cpa
                        .precision_adjust(&successor, precision, exploration.reached())?;
                if adjusted.action == Action::Discard {
                    self.statistics.discarded += 1;
                    trace!(%edge, "successor discarded by precision adjustment");
                    continue;
                }

                let accepted = self.accept(exploration, expansion, adjusted.state, adjusted.precision)?;
                let is_target = accepted
                    .and_then(|id| exploration.reached().state(id))
                    .is_some_and(AbstractState::is_target);
                if let Some(id) = accepted {
                    expansion.added.push(id);
                    if is_target {
                        self.statistics.targets += 1;
                        expansion.targets.push(id);
                        info!(target = %id, %edge, "reached a target state");
                    }
                }

                let yielding = adjusted.action == Action::Break;
                if yielding || (is_target && self.config.stop_after_target) {
                    let unfinished = index + 1 < count || edge_index + 1 < edges.len();
                    if unfinished {
                        exploration.reached_mut().re_add_to_waitlist(expansion.state);
                    }
                    expansion.yielded = yielding;
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }

    /// Merge `state` into its partition, then cover or add it. Returns the id
    /// of the added state.
    fn accept(
        &mut self,
        exploration: &mut ExplorationOf<C>,
        expansion: &mut Expansion,
        state: C::State,
        precision: C::Precision,
    ) -> Result<Option<StateId>, CpaError> {
        let key = partition_of(&state);
        let candidates: Vec<(StateId, C::State)> = exploration
            .reached()
            .states_at_partition(&key)
            .map(|(id, reached)| (id, reached.clone()))
            .collect();

        for (old, old_state) in candidates {
            let merged = self.cpa.merge(&state, &old_state, &precision)?;
            if merged == old_state {
                continue;
            }
            assert_eq!(
                partition_of(&merged),
                key,
                "merging into state {old} moved it out of its partition"
            );
            let id = exploration.replace(old, merged, precision.clone());
            if expansion.state == old {
                expansion.state = id;
            }
            exploration.link(expansion.state, id);
            expansion.merged.push(id);
            self.statistics.merged += 1;
            debug!(%old, merged = %id, partition = %key, "merged successor into reached state");
        }

        let coverers: Option<SmallVec<[StateId; 2]>> = {
            let reached: Vec<(StateId, &C::State)> =
                exploration.reached().states_at_partition(&key).collect();
            let states: Vec<&C::State> = reached.iter().map(|(_, s)| *s).collect();
            if !self.cpa.stop(&state, &states, &precision)? {
                None
            } else {
                // a stop operator may cover without any single subsuming
                // state; then every state of the partition is a coverer
                Some(match covering_index(self.cpa.domain(), &state, &states)? {
                    Some(i) => smallvec![reached[i].0],
                    None => reached.iter().map(|(id, _)| *id).collect(),
                })
            }
        };

        if let Some(coverers) = coverers {
            self.statistics.covered += 1;
            match coverers.as_slice() {
                &[by] if self.config.keep_covered_in_arg => {
                    let leaf = exploration.add_covered(expansion.state, state, by);
                    trace!(%leaf, covered_by = %by, "successor covered");
                }
                coverers => {
                    for &by in coverers {
                        exploration.record_cover(expansion.state, by);
                    }
                    trace!(partition = %key, coverers = coverers.len(), "successor covered");
                }
            }
            return Ok(None);
        }

        let id = exploration.add_child(expansion.state, state, precision);
        self.statistics.added += 1;
        trace!(state = %id, parent = %expansion.state, partition = %key, "accepted successor");
        Ok(Some(id))
    }
}
