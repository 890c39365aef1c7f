use std::fmt;

use tessera_cfa::{Cfa, CfaEdge};

use super::{Arg, StateId};
use crate::AbstractState;

/// A root-to-node chain of ARG nodes, the raw material of a witness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgPath {
    nodes: Vec<StateId>,
}

impl ArgPath {
    pub(crate) fn new(nodes: Vec<StateId>) -> Self {
        ArgPath { nodes }
    }

    pub fn nodes(&self) -> &[StateId] {
        &self.nodes
    }

    pub fn first(&self) -> Option<StateId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<StateId> {
        self.nodes.last().copied()
    }

    /// Number of nodes on the path.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The control-flow edges taken between consecutive nodes.
    ///
    /// `None` if a node is dead, has no location, or two consecutive
    /// locations are not connected in `cfa`.
    pub fn edges<'c, S: AbstractState>(
        &self,
        arg: &Arg<S>,
        cfa: &'c Cfa,
    ) -> Option<Vec<&'c CfaEdge>> {
        let locations = self
            .nodes
            .iter()
            .map(|&id| arg.state(id)?.location())
            .collect::<Option<Vec<_>>>()?;
        locations
            .windows(2)
            .map(|pair| cfa.edge_between(pair[0], pair[1]))
            .collect()
    }
}

impl fmt::Display for ArgPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}
