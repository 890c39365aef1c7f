use std::hash::Hash;

use tessera_cfa::Location;

use crate::adjustment::{PruneSummary, prune_flagged};
use crate::{
    AbstractDomain, AbstractState, Adjustment, CpaError, Exploration, MergePolicy, Precision,
    ReachedView, StopPolicy, TransferRelation,
};

/// One pluggable analysis: a domain, a transfer relation, merge and stop
/// operators, and an optional precision-adjustment hook.
///
/// Merge and stop are provided from [`MergePolicy`] and [`StopPolicy`];
/// override them only for behavior the policies cannot express. The two
/// adjustment methods are used by
/// [`ConditionAdjustment`](crate::ConditionAdjustment) and can be left
/// alone by analyses that do not refine.
pub trait ConfigurableProgramAnalysis {
    type State: AbstractState + Clone + Eq + Hash;
    type Precision: Precision + Clone;
    type Domain: AbstractDomain<State = Self::State>;
    type Transfer: TransferRelation<State = Self::State, Precision = Self::Precision>;

    /// Name used in diagnostics and error messages.
    fn name(&self) -> &str;

    fn domain(&self) -> &Self::Domain;

    fn transfer_relation(&self) -> &Self::Transfer;

    fn initial_state(&self, location: Location) -> Result<Self::State, CpaError>;

    fn initial_precision(&self, location: Location) -> Result<Self::Precision, CpaError>;

    /// Policy consulted by the provided [`merge`](Self::merge).
    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::Sep
    }

    /// Policy consulted by the provided [`stop`](Self::stop).
    fn stop_policy(&self) -> StopPolicy {
        StopPolicy::Sep
    }

    /// Returns `old` unchanged, or a state `m` with `old ⊑ m`.
    fn merge(
        &self,
        new: &Self::State,
        old: &Self::State,
        precision: &Self::Precision,
    ) -> Result<Self::State, CpaError> {
        let _ = precision;
        self.merge_policy().apply(self.domain(), new, old)
    }

    /// Whether `state` is covered by some state of `reached`, all of which
    /// share its partition.
    fn stop(
        &self,
        state: &Self::State,
        reached: &[&Self::State],
        precision: &Self::Precision,
    ) -> Result<bool, CpaError> {
        let _ = precision;
        self.stop_policy().apply(self.domain(), state, reached)
    }

    fn precision_adjust(
        &self,
        state: &Self::State,
        precision: &Self::Precision,
        reached: &dyn ReachedView,
    ) -> Result<Adjustment<Self::State, Self::Precision>, CpaError> {
        let _ = reached;
        Ok(Adjustment::unchanged(state.clone(), precision.clone()))
    }

    /// Relax internal precision after a run hit a limit. Returns whether
    /// anything changed.
    fn adjust_precision(&mut self) -> Result<bool, CpaError> {
        Ok(false)
    }

    /// Drop reached states made stale by [`adjust_precision`](Self::adjust_precision).
    ///
    /// By default every state answering [`AbstractState::must_dump`] is pruned
    /// and its surviving parents are re-queued.
    fn adjust_reached_set(
        &self,
        exploration: &mut Exploration<Self::State, Self::Precision>,
    ) -> Result<PruneSummary, CpaError> {
        Ok(prune_flagged(exploration, |state: &Self::State| {
            state.must_dump()
        }))
    }
}
