use std::sync::Arc;

use petgraph::graph::NodeIndex;

/// A program location: one node of the control-flow automaton.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location(pub(crate) u32);

impl Location {
    /// return raw index as usize
    pub fn raw(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn index(self) -> NodeIndex {
        NodeIndex::new(self.raw())
    }
}

impl From<NodeIndex> for Location {
    fn from(value: NodeIndex) -> Self {
        Location(value.index() as u32)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "N{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// Function entry.
    Entry,
    Regular,
    /// Function exit; no outgoing edges are expected.
    Exit,
    /// A location whose reachability is the search target.
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CfaNode {
    pub location: Location,
    pub kind: NodeKind,
    pub label: Option<Arc<str>>,
}

impl CfaNode {
    pub fn is_error(&self) -> bool {
        self.kind == NodeKind::Error
    }
}
