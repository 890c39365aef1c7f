use crate::{PartitionKey, StateId};

/// What the algorithm does with a successor after precision adjustment.
///
/// Ordered by severity: combining actions keeps the strongest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    #[default]
    Continue,
    /// Keep the successor but stop expanding its parent for this round.
    Break,
    /// Drop the successor.
    Discard,
}

impl Action {
    pub fn combine(self, other: Action) -> Action {
        self.max(other)
    }
}

/// Result of precision adjustment for one successor.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment<S, P> {
    pub state: S,
    pub precision: P,
    pub action: Action,
}

impl<S, P> Adjustment<S, P> {
    pub fn new(state: S, precision: P, action: Action) -> Self {
        Adjustment {
            state,
            precision,
            action,
        }
    }

    pub fn unchanged(state: S, precision: P) -> Self {
        Self::new(state, precision, Action::Continue)
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }
}

/// Read-only view of a reached set handed to precision adjustment.
pub trait ReachedView {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn waitlist_len(&self) -> usize;

    fn contains(&self, id: StateId) -> bool;

    /// Number of reached states at `key`.
    fn partition_len(&self, key: &PartitionKey) -> usize;

    /// The root, if it is still reached.
    fn first(&self) -> Option<StateId>;

    /// The most recently added state, if it is still reached.
    fn last(&self) -> Option<StateId>;
}
