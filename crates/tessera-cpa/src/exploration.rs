use rustc_hash::FxHashMap;

use crate::arg::IdSet;
use crate::{AbstractState, Arg, ArgPath, ReachedSet, StateId, TraversalOrder};

/// A reached set and its ARG, kept in step.
///
/// Every reached state has an ARG node under the same [`StateId`]. The ARG
/// may hold extra leaves for covered successors that were never added to
/// the reached set. Covered successors that got no leaf are still recorded,
/// as a parent under the state that covered them.
#[derive(Debug, Clone)]
pub struct Exploration<S, P> {
    reached: ReachedSet<S, P>,
    arg: Arg<S>,
    /// Coverer -> parents whose successor it covered without an ARG leaf.
    covered_parents: FxHashMap<StateId, IdSet>,
}

impl<S, P> Default for Exploration<S, P> {
    fn default() -> Self {
        Self::new(TraversalOrder::default())
    }
}

impl<S, P> Exploration<S, P> {
    pub fn new(order: TraversalOrder) -> Self {
        Exploration {
            reached: ReachedSet::new(order),
            arg: Arg::new(),
            covered_parents: FxHashMap::default(),
        }
    }

    pub fn reached(&self) -> &ReachedSet<S, P> {
        &self.reached
    }

    /// Mutable access to the reached set alone, for re-queueing and
    /// precision updates. Removing states here leaves the ARG stale; use
    /// [`Exploration::remove`] instead.
    pub fn reached_mut(&mut self) -> &mut ReachedSet<S, P> {
        &mut self.reached
    }

    pub fn arg(&self) -> &Arg<S> {
        &self.arg
    }

    pub fn len(&self) -> usize {
        self.reached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reached.is_empty()
    }

    pub fn root(&self) -> Option<StateId> {
        self.reached.first()
    }

    /// Remove a state from both structures. Returns the ARG neighbourhood it
    /// had, or `None` if it was not part of the exploration.
    pub fn remove(&mut self, id: StateId) -> Option<crate::Detached> {
        self.reached.remove(id);
        self.covered_parents.remove(&id);
        self.arg.contains(id).then(|| self.arg.remove(id))
    }

    pub fn clear(&mut self) {
        self.reached.clear();
        self.arg.clear();
        self.covered_parents.clear();
    }

    /// Remember that a successor of `parent` was covered by `covered_by`
    /// without getting an ARG leaf.
    pub fn record_cover(&mut self, parent: StateId, covered_by: StateId) {
        self.covered_parents
            .entry(covered_by)
            .or_default()
            .insert(parent);
    }

    /// Parents whose successors `coverer` covered without an ARG leaf. Some
    /// of them may have been removed since.
    pub fn covered_parents(&self, coverer: StateId) -> impl Iterator<Item = StateId> + '_ {
        self.covered_parents
            .get(&coverer)
            .into_iter()
            .flatten()
            .copied()
    }

    pub fn path_to(&self, id: StateId) -> Option<ArgPath> {
        self.arg.path_to_root(id)
    }

    /// Panic unless the reached set and ARG agree with each other.
    pub fn check_consistency(&self) {
        self.reached.check_consistency();
        self.arg.check_consistency();
        for id in self.reached.ids() {
            assert!(self.arg.contains(id), "reached state {id} has no ARG node");
        }
        assert_eq!(
            self.reached.first(),
            self.arg.root(),
            "reached set root and ARG root diverged"
        );
    }
}

impl<S: AbstractState + Clone, P> Exploration<S, P> {
    /// Start from `state`. The exploration must be empty.
    pub fn seed(&mut self, state: S, precision: P) -> StateId {
        assert!(
            self.reached.is_empty() && self.arg.is_empty(),
            "cannot seed a non-empty exploration"
        );
        let id = self.arg.create_node(state.clone());
        self.reached.add(id, state, precision);
        id
    }

    /// Accept `state` as a successor of `parent` and queue it.
    pub fn add_child(&mut self, parent: StateId, state: S, precision: P) -> StateId {
        let id = self.arg.create_node(state.clone());
        self.arg.link(parent, id);
        self.reached.add(id, state, precision);
        id
    }

    /// Record a covered successor of `parent` as an ARG leaf. It is not
    /// reached and never expanded.
    pub fn add_covered(&mut self, parent: StateId, state: S, covered_by: StateId) -> StateId {
        let id = self.arg.create_node(state);
        self.arg.link(parent, id);
        self.arg.cover(id, covered_by);
        id
    }

    /// Replace `old` with the merged `state`. The merged state gets a fresh
    /// id, takes over the ARG links of `old` and is queued.
    pub fn replace(&mut self, old: StateId, state: S, precision: P) -> StateId {
        let id = self.arg.create_node(state.clone());
        self.arg.replace(old, id);
        self.reached.replace(old, id, state, precision);
        // the merged state is above `old`, so it still covers what `old` did
        if let Some(parents) = self.covered_parents.remove(&old) {
            self.covered_parents.insert(id, parents);
        }
        id
    }

    pub fn link(&mut self, parent: StateId, child: StateId) {
        self.arg.link(parent, child);
    }

    /// Reached states answering [`AbstractState::is_target`].
    pub fn targets(&self) -> impl Iterator<Item = StateId> + '_ {
        self.reached
            .iter()
            .filter(|(_, entry)| entry.state.is_target())
            .map(|(id, _)| id)
    }
}
