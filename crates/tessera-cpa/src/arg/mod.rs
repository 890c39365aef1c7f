//! Abstract reachability graph.
//!
//! Nodes live in an arena and refer to each other by [`StateId`]; removing a
//! node is an index update on its neighbours and never leaves a dangling
//! reference behind.

mod path;

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use tessera_arena::Arena;

pub use path::ArgPath;

tessera_arena::identifier! {
    /// Identifier of one accepted abstract state.
    ///
    /// Allocated monotonically by the [`Arg`] and never reused, not even
    /// after [`Arg::clear`].
    pub struct StateId
}

pub(crate) type IdSet = IndexSet<StateId, FxBuildHasher>;

#[derive(Debug, Clone)]
pub struct ArgNode<S> {
    state: S,
    parents: IdSet,
    children: IdSet,
    covered_by: Option<StateId>,
    covering: IdSet,
}

impl<S> ArgNode<S> {
    fn new(state: S) -> Self {
        ArgNode {
            state,
            parents: IdSet::default(),
            children: IdSet::default(),
            covered_by: None,
            covering: IdSet::default(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn parents(&self) -> impl Iterator<Item = StateId> + '_ {
        self.parents.iter().copied()
    }

    pub fn children(&self) -> impl Iterator<Item = StateId> + '_ {
        self.children.iter().copied()
    }

    /// The node that subsumes this one, if it was covered.
    pub fn covered_by(&self) -> Option<StateId> {
        self.covered_by
    }

    /// Nodes covered by this one.
    pub fn covering(&self) -> impl Iterator<Item = StateId> + '_ {
        self.covering.iter().copied()
    }

    pub fn is_covered(&self) -> bool {
        self.covered_by.is_some()
    }
}

/// Neighbourhood of a node at the moment it was removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detached {
    pub parents: Vec<StateId>,
    pub children: Vec<StateId>,
    /// Nodes that were covered by the removed node and no longer are.
    pub uncovered: Vec<StateId>,
}

#[derive(Debug, Clone)]
pub struct Arg<S> {
    nodes: Arena<StateId, ArgNode<S>>,
    root: Option<StateId>,
}

impl<S> Default for Arg<S> {
    fn default() -> Self {
        Arg {
            nodes: Arena::default(),
            root: None,
        }
    }
}

impl<S> Arg<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unlinked node. The first node created in an empty graph
    /// becomes the root.
    pub fn create_node(&mut self, state: S) -> StateId {
        let was_empty = self.nodes.is_empty();
        let id = self.nodes.alloc(ArgNode::new(state));
        if was_empty {
            self.root = Some(id);
        }
        id
    }

    pub fn root(&self) -> Option<StateId> {
        self.root
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.nodes.contains(id)
    }

    pub fn node(&self, id: StateId) -> Option<&ArgNode<S>> {
        self.nodes.get(id)
    }

    pub fn state(&self, id: StateId) -> Option<&S> {
        self.node(id).map(ArgNode::state)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The identifier the next created node will get.
    pub fn next_id(&self) -> StateId {
        self.nodes.next_id()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, &ArgNode<S>)> {
        self.nodes.iter()
    }

    /// Parents of `id`; empty for dead nodes.
    pub fn parents(&self, id: StateId) -> impl Iterator<Item = StateId> + '_ {
        self.node(id).into_iter().flat_map(ArgNode::parents)
    }

    /// Children of `id`; empty for dead nodes.
    pub fn children(&self, id: StateId) -> impl Iterator<Item = StateId> + '_ {
        self.node(id).into_iter().flat_map(ArgNode::children)
    }

    pub fn covered_by(&self, id: StateId) -> Option<StateId> {
        self.node(id).and_then(ArgNode::covered_by)
    }

    pub fn link(&mut self, parent: StateId, child: StateId) {
        self.live_mut(parent).children.insert(child);
        self.live_mut(child).parents.insert(parent);
    }

    /// Record that `node` is subsumed by `by`, replacing any earlier cover.
    pub fn cover(&mut self, node: StateId, by: StateId) {
        assert_ne!(node, by, "ARG node {node} cannot cover itself");
        self.live(by);
        self.uncover(node);
        self.live_mut(node).covered_by = Some(by);
        self.live_mut(by).covering.insert(node);
    }

    /// Clear the cover of `node`. Returns the former coverer.
    pub fn uncover(&mut self, node: StateId) -> Option<StateId> {
        let by = self.live_mut(node).covered_by.take()?;
        if let Some(coverer) = self.nodes.get_mut(by) {
            coverer.covering.shift_remove(&node);
        }
        Some(by)
    }

    /// Detach `id` from the graph and kill it.
    ///
    /// The node disappears from every parent, child and cover set; nodes it
    /// covered lose their cover. The reached set is not touched.
    pub fn remove(&mut self, id: StateId) -> Detached {
        let node = self.live(id);
        let detached = Detached {
            parents: node.parents().filter(|&p| p != id).collect(),
            children: node.children().filter(|&c| c != id).collect(),
            uncovered: node.covering().collect(),
        };
        let covered_by = node.covered_by;

        for &parent in &detached.parents {
            self.live_mut(parent).children.shift_remove(&id);
        }
        for &child in &detached.children {
            self.live_mut(child).parents.shift_remove(&id);
        }
        for &covered in &detached.uncovered {
            self.live_mut(covered).covered_by = None;
        }
        if let Some(by) = covered_by {
            self.live_mut(by).covering.shift_remove(&id);
        }

        self.nodes.delete(id);
        if self.root == Some(id) {
            self.root = None;
        }
        detached
    }

    /// Replace `old` by `new` after a merge.
    ///
    /// `new` inherits the parents and children of `old` and everything `old`
    /// covered; a link from `old` to itself becomes a link from `new` to
    /// itself. `old` is removed and, if it was the root, `new` takes its place.
    pub fn replace(&mut self, old: StateId, new: StateId) {
        assert_ne!(old, new, "ARG node {old} cannot replace itself");
        self.live(new);
        let was_root = self.root == Some(old);
        let node = self.live(old);
        let rename = |id: StateId| if id == old { new } else { id };
        let parents: Vec<StateId> = node.parents().map(rename).collect();
        let children: Vec<StateId> = node.children().map(rename).collect();
        let covered: Vec<StateId> = node.covering().collect();

        self.remove(old);
        for parent in parents {
            self.link(parent, new);
        }
        for child in children {
            self.link(new, child);
        }
        for node in covered {
            if node != new {
                self.cover(node, new);
            }
        }
        if was_root {
            self.root = Some(new);
        }
    }

    /// Nodes reachable from `id` through child links, `id` first.
    pub fn subtree(&self, id: StateId) -> Vec<StateId> {
        let mut seen = IdSet::default();
        if !self.contains(id) {
            return Vec::new();
        }
        seen.insert(id);
        let mut cursor = 0;
        while let Some(&current) = seen.get_index(cursor) {
            cursor += 1;
            let children: Vec<StateId> = self.children(current).collect();
            seen.extend(children);
        }
        seen.into_iter().collect()
    }

    /// The parent chain from the root to `id`, following the oldest parent at
    /// each step. `None` if `id` is dead.
    pub fn path_to_root(&self, id: StateId) -> Option<ArgPath> {
        let mut seen = IdSet::default();
        let mut current = id;
        self.node(current)?;
        seen.insert(current);
        while let Some(parent) = self.parents(current).find(|p| !seen.contains(p)) {
            seen.insert(parent);
            current = parent;
        }
        let mut nodes: Vec<StateId> = seen.into_iter().collect();
        nodes.reverse();
        Some(ArgPath::new(nodes))
    }

    /// Kill every node. Identifiers keep counting up.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Panic unless every link, cover and the root refer to live nodes and
    /// every link is recorded on both ends.
    pub fn check_consistency(&self) {
        if let Some(root) = self.root {
            assert!(self.contains(root), "ARG root {root} is dead");
        }
        for (id, node) in self.iter() {
            for parent in node.parents() {
                let other = self
                    .node(parent)
                    .unwrap_or_else(|| panic!("ARG node {id} has dead parent {parent}"));
                assert!(
                    other.children.contains(&id),
                    "ARG node {parent} does not list child {id}"
                );
            }
            for child in node.children() {
                let other = self
                    .node(child)
                    .unwrap_or_else(|| panic!("ARG node {id} has dead child {child}"));
                assert!(
                    other.parents.contains(&id),
                    "ARG node {child} does not list parent {id}"
                );
            }
            if let Some(by) = node.covered_by {
                let other = self
                    .node(by)
                    .unwrap_or_else(|| panic!("ARG node {id} is covered by dead node {by}"));
                assert!(
                    other.covering.contains(&id),
                    "ARG node {by} does not list covered node {id}"
                );
            }
            for covered in node.covering() {
                assert_eq!(
                    self.covered_by(covered),
                    Some(id),
                    "ARG node {covered} is not covered by {id}"
                );
            }
        }
    }

    fn live(&self, id: StateId) -> &ArgNode<S> {
        self.node(id)
            .unwrap_or_else(|| panic!("ARG node {id} is dead or was never created"))
    }

    fn live_mut(&mut self, id: StateId) -> &mut ArgNode<S> {
        self.nodes
            .get_mut(id)
            .unwrap_or_else(|| panic!("ARG node {id} is dead or was never created"))
    }
}
