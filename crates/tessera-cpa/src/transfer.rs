use smallvec::SmallVec;
use tessera_cfa::CfaEdge;

use crate::{AbstractState, CpaError};

/// Successor states of one state along one edge.
pub type Successors<S> = SmallVec<[S; 2]>;

/// Computes successors along control-flow edges.
pub trait TransferRelation {
    type State: Clone;
    type Precision;

    /// Zero, one or several successors of `state` along `edge`.
    ///
    /// An empty result means the edge is infeasible from `state`.
    fn successors(
        &self,
        state: &Self::State,
        precision: &Self::Precision,
        edge: &CfaEdge,
    ) -> Result<Successors<Self::State>, CpaError>;

    /// Restrict a tentative successor using the successors other analyses
    /// produced for the same edge. `siblings` holds the whole tuple, this
    /// state included; returning `None` rejects the combination.
    fn strengthen(
        &self,
        state: &Self::State,
        siblings: &[&dyn AbstractState],
        edge: &CfaEdge,
        precision: &Self::Precision,
    ) -> Result<Option<Self::State>, CpaError> {
        let _ = (siblings, edge, precision);
        Ok(Some(state.clone()))
    }
}
