mod waitlist;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::arg::IdSet;
use crate::{AbstractState, PartitionKey, ReachedView, StateId, partition_of};

pub use waitlist::TraversalOrder;
use waitlist::Waitlist;

/// A reached state with the precision it was reached under.
#[derive(Debug, Clone)]
pub struct ReachedEntry<S, P> {
    pub state: S,
    pub precision: P,
    pub partition: PartitionKey,
}

/// Every accepted state with its precision, a per-partition index and the
/// waitlist of states pending expansion.
///
/// Each waitlisted state is also in the mapping; removing a state drops it
/// from the waitlist and its partition. Iteration follows insertion order.
#[derive(Debug, Clone)]
pub struct ReachedSet<S, P> {
    entries: IndexMap<StateId, ReachedEntry<S, P>, FxBuildHasher>,
    partitions: FxHashMap<PartitionKey, IdSet>,
    waitlist: Waitlist,
    first: Option<StateId>,
    last: Option<StateId>,
}

impl<S, P> Default for ReachedSet<S, P> {
    fn default() -> Self {
        Self::new(TraversalOrder::default())
    }
}

impl<S, P> ReachedSet<S, P> {
    pub fn new(order: TraversalOrder) -> Self {
        ReachedSet {
            entries: IndexMap::default(),
            partitions: FxHashMap::default(),
            waitlist: Waitlist::new(order),
            first: None,
            last: None,
        }
    }

    pub fn traversal_order(&self) -> TraversalOrder {
        self.waitlist.order()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: StateId) -> Option<&ReachedEntry<S, P>> {
        self.entries.get(&id)
    }

    pub fn state(&self, id: StateId) -> Option<&S> {
        self.get(id).map(|entry| &entry.state)
    }

    pub fn precision(&self, id: StateId) -> Option<&P> {
        self.get(id).map(|entry| &entry.precision)
    }

    /// The root: the first state added since the set was last cleared.
    pub fn first(&self) -> Option<StateId> {
        self.first.filter(|&id| self.contains(id))
    }

    pub fn last(&self) -> Option<StateId> {
        self.last.filter(|&id| self.contains(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, &ReachedEntry<S, P>)> {
        self.entries.iter().map(|(&id, entry)| (id, entry))
    }

    pub fn ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.entries.keys().copied()
    }

    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.entries.values().map(|entry| &entry.state)
    }

    /// Reached states at `key`, in insertion order.
    pub fn states_at_partition<'a>(
        &'a self,
        key: &PartitionKey,
    ) -> impl Iterator<Item = (StateId, &'a S)> + 'a {
        self.partitions
            .get(key)
            .into_iter()
            .flatten()
            .map(|&id| (id, &self.entries[&id].state))
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn waitlist_len(&self) -> usize {
        self.waitlist.len()
    }

    pub fn has_waiting_state(&self) -> bool {
        self.waitlist.len() > 0
    }

    pub fn is_waiting(&self, id: StateId) -> bool {
        self.waitlist.contains(id)
    }

    /// Waitlisted states in queue order.
    pub fn waitlist(&self) -> impl Iterator<Item = StateId> + '_ {
        self.waitlist.iter()
    }

    /// Next state to expand.
    pub fn pop(&mut self) -> Option<StateId> {
        let id = self.waitlist.pop()?;
        assert!(
            self.contains(id),
            "waitlisted state {id} is missing from the reached set"
        );
        Some(id)
    }

    pub fn remove(&mut self, id: StateId) -> Option<ReachedEntry<S, P>> {
        let entry = self.entries.shift_remove(&id)?;
        self.waitlist.remove(id);
        if let Some(bucket) = self.partitions.get_mut(&entry.partition) {
            bucket.shift_remove(&id);
            if bucket.is_empty() {
                self.partitions.remove(&entry.partition);
            }
        }
        Some(entry)
    }

    /// Force `id` to be expanded again. Returns `false` if it was already
    /// waiting.
    pub fn re_add_to_waitlist(&mut self, id: StateId) -> bool {
        assert!(
            self.contains(id),
            "cannot re-queue state {id}: it is not reached"
        );
        self.waitlist.push(id)
    }

    /// Swap the precision of a reached state, returning the old one.
    pub fn update_precision(&mut self, id: StateId, precision: P) -> Option<P> {
        let entry = self.entries.get_mut(&id)?;
        Some(std::mem::replace(&mut entry.precision, precision))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.partitions.clear();
        self.waitlist.clear();
        self.first = None;
        self.last = None;
    }

    /// Panic unless the waitlist and partition index agree with the mapping.
    pub fn check_consistency(&self) {
        for id in self.waitlist.iter() {
            assert!(
                self.contains(id),
                "waitlisted state {id} is missing from the reached set"
            );
        }
        let mut indexed = 0;
        for (key, bucket) in &self.partitions {
            assert!(!bucket.is_empty(), "empty partition {key} kept alive");
            for id in bucket {
                let entry = self
                    .get(*id)
                    .unwrap_or_else(|| panic!("partition {key} lists unreached state {id}"));
                assert_eq!(
                    &entry.partition, key,
                    "state {id} is indexed under the wrong partition"
                );
            }
            indexed += bucket.len();
        }
        assert_eq!(indexed, self.len(), "partition index out of sync");
    }
}

impl<S: AbstractState, P> ReachedSet<S, P> {
    /// Insert a new state and queue it for expansion.
    pub fn add(&mut self, id: StateId, state: S, precision: P) {
        assert!(!self.contains(id), "state {id} is already reached");
        let partition = partition_of(&state);
        self.partitions
            .entry(partition.clone())
            .or_default()
            .insert(id);
        self.entries.insert(
            id,
            ReachedEntry {
                state,
                precision,
                partition,
            },
        );
        self.waitlist.push(id);
        if self.first.is_none() {
            self.first = Some(id);
        }
        self.last = Some(id);
    }

    /// Replace `old` by a merged state under a fresh id. The new state is
    /// queued and inherits the root role from `old`.
    pub fn replace(&mut self, old: StateId, new: StateId, state: S, precision: P) {
        let removed = self.remove(old);
        assert!(removed.is_some(), "cannot replace state {old}: it is not reached");
        let was_first = self.first == Some(old);
        self.add(new, state, precision);
        if was_first {
            self.first = Some(new);
        }
    }
}

impl<S, P> ReachedView for ReachedSet<S, P> {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn waitlist_len(&self) -> usize {
        self.waitlist.len()
    }

    fn contains(&self, id: StateId) -> bool {
        self.entries.contains_key(&id)
    }

    fn partition_len(&self, key: &PartitionKey) -> usize {
        self.partitions.get(key).map_or(0, IndexSet::len)
    }

    fn first(&self) -> Option<StateId> {
        ReachedSet::first(self)
    }

    fn last(&self) -> Option<StateId> {
        ReachedSet::last(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Arg;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct At(u32, &'static str);

    impl AbstractState for At {
        fn partition_key(&self) -> Option<PartitionKey> {
            Some(PartitionKey::Value(self.0 as i64))
        }
    }

    fn ids(n: usize) -> Vec<StateId> {
        let mut arg = Arg::new();
        (0..n).map(|i| arg.create_node(i)).collect()
    }

    #[test]
    fn test_bfs_and_dfs_order() {
        let ids = ids(3);
        let mut bfs = ReachedSet::new(TraversalOrder::Bfs);
        let mut dfs = ReachedSet::new(TraversalOrder::Dfs);
        for (i, &id) in ids.iter().enumerate() {
            bfs.add(id, At(i as u32, "x"), ());
            dfs.add(id, At(i as u32, "x"), ());
        }
        assert_eq!(bfs.pop(), Some(ids[0]));
        assert_eq!(dfs.pop(), Some(ids[2]));
        assert_eq!(bfs.first(), Some(ids[0]));
        assert_eq!(dfs.last(), Some(ids[2]));
    }

    #[test]
    fn test_remove_updates_every_index() {
        let ids = ids(3);
        let mut reached = ReachedSet::default();
        reached.add(ids[0], At(0, "a"), ());
        reached.add(ids[1], At(1, "b"), ());
        reached.add(ids[2], At(1, "c"), ());

        let key = PartitionKey::Value(1);
        assert_eq!(reached.states_at_partition(&key).count(), 2);
        assert!(reached.remove(ids[1]).is_some());
        assert!(!reached.is_waiting(ids[1]));
        assert_eq!(
            reached.states_at_partition(&key).collect::<Vec<_>>(),
            vec![(ids[2], &At(1, "c"))]
        );
        assert!(reached.remove(ids[1]).is_none());
        reached.check_consistency();

        reached.remove(ids[2]);
        assert_eq!(reached.partition_count(), 1);
        assert_eq!(reached.partition_len(&key), 0);
    }

    #[test]
    fn test_waitlist_stays_within_mapping() {
        let ids = ids(6);
        let mut reached = ReachedSet::default();
        for (i, &id) in ids.iter().enumerate() {
            reached.add(id, At(i as u32 % 2, "s"), ());
            if i % 3 == 2 {
                reached.pop();
            }
            if i % 2 == 1 {
                reached.remove(ids[i - 1]);
            }
            reached.check_consistency();
        }
        while let Some(id) = reached.pop() {
            assert!(reached.contains(id));
        }
        assert_eq!(reached.waitlist_len(), 0);
    }

    #[test]
    fn test_re_add_does_not_duplicate() {
        let ids = ids(1);
        let mut reached = ReachedSet::default();
        reached.add(ids[0], At(0, "a"), 1u8);
        assert!(!reached.re_add_to_waitlist(ids[0]));
        assert_eq!(reached.pop(), Some(ids[0]));
        assert!(reached.re_add_to_waitlist(ids[0]));
        assert_eq!(reached.waitlist_len(), 1);
        assert_eq!(reached.update_precision(ids[0], 2), Some(1));
        assert_eq!(reached.precision(ids[0]), Some(&2));
    }

    #[test]
    fn test_replace_moves_root() {
        let ids = ids(2);
        let mut reached = ReachedSet::default();
        reached.add(ids[0], At(0, "old"), ());
        reached.pop();
        reached.replace(ids[0], ids[1], At(0, "merged"), ());
        assert_eq!(reached.first(), Some(ids[1]));
        assert!(reached.is_waiting(ids[1]));
        assert_eq!(reached.len(), 1);
    }

    #[test]
    #[should_panic(expected = "it is not reached")]
    fn test_re_add_unknown_state_panics() {
        let ids = ids(1);
        let mut reached: ReachedSet<At, ()> = ReachedSet::default();
        reached.re_add_to_waitlist(ids[0]);
    }
}
