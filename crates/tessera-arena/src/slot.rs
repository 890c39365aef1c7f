/// One arena slot. Deleting a slot drops its payload; the slot itself stays
/// so its index is never handed out again.
#[derive(Debug, Clone)]
pub(crate) enum Slot<T> {
    Live(T),
    Dead,
}

impl<T> Slot<T> {
    pub(crate) fn get(&self) -> Option<&T> {
        match self {
            Slot::Live(data) => Some(data),
            Slot::Dead => None,
        }
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Live(data) => Some(data),
            Slot::Dead => None,
        }
    }

    /// Kill the slot, returning what it held.
    pub(crate) fn take(&mut self) -> Option<T> {
        match std::mem::replace(self, Slot::Dead) {
            Slot::Live(data) => Some(data),
            Slot::Dead => None,
        }
    }
}
