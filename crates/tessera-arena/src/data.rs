use super::id::{Id, Identifier};
use super::slot::Slot;

/// Append-only storage addressed by typed identifiers.
///
/// Deleting an item drops it but keeps its slot, so identifiers are never
/// reused: an id handed out once names the same (possibly dead) slot forever.
#[derive(Debug, Clone)]
pub struct Arena<I: Identifier, T> {
    slots: Vec<Slot<T>>,
    live: usize,
    marker: std::marker::PhantomData<I>,
}

impl<I: Identifier, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            marker: std::marker::PhantomData,
        }
    }
}

impl<I: Identifier, T> Arena<I, T> {
    pub fn next_id(&self) -> I {
        I::from(Id(self.slots.len()))
    }

    /// Number of slots ever allocated, dead ones included.
    pub fn capacity_used(&self) -> usize {
        self.slots.len()
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn alloc(&mut self, item: T) -> I {
        let id = self.next_id();
        self.slots.push(Slot::Live(item));
        self.live += 1;
        id
    }

    /// Whether `id` names a live item.
    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.into().raw()).and_then(Slot::get)
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.into().raw()).and_then(Slot::get_mut)
    }

    /// Drop the item at `id`. Returns it, or `None` if it was already dead.
    pub fn delete(&mut self, id: I) -> Option<T> {
        let item = self.slots.get_mut(id.into().raw())?.take()?;
        self.live -= 1;
        Some(item)
    }

    /// Drop every item without giving up the identifier space.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = Slot::Dead);
        self.live = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(raw, slot)| Some((I::from(Id(raw)), slot.get()?)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(raw, slot)| Some((I::from(Id(raw)), slot.get_mut()?)))
    }

    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.iter().map(|(id, _)| id)
    }
}

impl<T, I: Identifier> std::ops::Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, index: I) -> &T {
        self.get(index)
            .unwrap_or_else(|| panic!("arena item {index:?} is dead or was never allocated"))
    }
}

impl<T, I: Identifier> std::ops::IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, index: I) -> &mut T {
        self.get_mut(index)
            .unwrap_or_else(|| panic!("arena item {index:?} is dead or was never allocated"))
    }
}
