use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::StateId;

/// Order in which frontier states are popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TraversalOrder {
    /// First in, first out.
    #[default]
    Bfs,
    /// Last in, first out.
    Dfs,
}

/// Frontier of the reached set. Holds each state at most once.
#[derive(Debug, Clone, Default)]
pub(crate) struct Waitlist {
    order: TraversalOrder,
    queue: VecDeque<StateId>,
    members: FxHashSet<StateId>,
}

impl Waitlist {
    pub(crate) fn new(order: TraversalOrder) -> Self {
        Waitlist {
            order,
            ..Default::default()
        }
    }

    pub(crate) fn order(&self) -> TraversalOrder {
        self.order
    }

    /// Enqueue `id` unless it is already waiting.
    pub(crate) fn push(&mut self, id: StateId) -> bool {
        if self.members.insert(id) {
            self.queue.push_back(id);
            true
        } else {
            false
        }
    }

    pub(crate) fn pop(&mut self) -> Option<StateId> {
        let id = match self.order {
            TraversalOrder::Bfs => self.queue.pop_front(),
            TraversalOrder::Dfs => self.queue.pop_back(),
        }?;
        self.members.remove(&id);
        Some(id)
    }

    pub(crate) fn remove(&mut self, id: StateId) -> bool {
        if self.members.remove(&id) {
            self.queue.retain(|&waiting| waiting != id);
            true
        } else {
            false
        }
    }

    pub(crate) fn contains(&self, id: StateId) -> bool {
        self.members.contains(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.queue.iter().copied()
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
        self.members.clear();
    }
}
