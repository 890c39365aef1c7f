use std::fmt;
use std::sync::Arc;

use petgraph::graph::EdgeIndex;

use crate::Location;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    pub fn raw(self) -> usize {
        self.0 as usize
    }
}

impl From<EdgeIndex> for EdgeId {
    fn from(value: EdgeIndex) -> Self {
        EdgeId(value.index() as u32)
    }
}

/// The operation attached to a control-flow edge.
///
/// Labels are opaque text: analyses that need structured statements keep
/// their own side tables keyed by [`EdgeId`].
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeLabel {
    /// No operation.
    Blank,
    Statement(Arc<str>),
    /// Continue only if `condition` evaluates to `truth`.
    Assume { condition: Arc<str>, truth: bool },
    Call(Arc<str>),
    Return(Arc<str>),
}

impl EdgeLabel {
    pub fn statement(text: impl Into<Arc<str>>) -> Self {
        EdgeLabel::Statement(text.into())
    }

    pub fn assume(condition: impl Into<Arc<str>>, truth: bool) -> Self {
        EdgeLabel::Assume {
            condition: condition.into(),
            truth,
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeLabel::Blank => write!(f, "skip"),
            EdgeLabel::Statement(text) => write!(f, "{text}"),
            EdgeLabel::Assume { condition, truth } => {
                if *truth {
                    write!(f, "[{condition}]")
                } else {
                    write!(f, "[!({condition})]")
                }
            }
            EdgeLabel::Call(name) => write!(f, "call {name}"),
            EdgeLabel::Return(name) => write!(f, "return {name}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CfaEdge {
    pub id: EdgeId,
    pub source: Location,
    pub target: Location,
    pub label: EdgeLabel,
}

impl fmt::Display for CfaEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -{{{}}}-> {}", self.source, self.label, self.target)
    }
}
