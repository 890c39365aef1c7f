use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tessera_cfa::Location;

use super::erased::{ComponentPrecision, ComponentState};
use crate::{AbstractState, Assumption, PartitionKey, Precision};

/// Ordered tuple of component states, one per component analysis.
///
/// Position `i` always holds a state of the `i`-th component. Cloning is
/// cheap: the tuple is shared.
#[derive(Clone)]
pub struct CompositeState {
    components: Arc<[ComponentState]>,
}

impl CompositeState {
    pub(crate) fn from_components(components: Vec<ComponentState>) -> Self {
        CompositeState {
            components: components.into(),
        }
    }

    pub(crate) fn component_arc(&self, index: usize) -> &ComponentState {
        &self.components[index]
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn AbstractState> {
        self.components.get(index).map(|state| state.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn AbstractState> {
        self.components.iter().map(|state| state.as_ref())
    }

    /// The first component state of type `T`.
    pub fn component<T: AbstractState>(&self) -> Option<&T> {
        self.iter().find_map(|state| state.downcast_ref::<T>())
    }
}

impl PartialEq for CompositeState {
    fn eq(&self, other: &Self) -> bool {
        self.components.len() == other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b) || a.as_ref().dyn_eq(b.as_ref().as_any()))
    }
}

impl Eq for CompositeState {}

impl Hash for CompositeState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.len().hash(state);
        for component in self.components.iter() {
            component.as_ref().dyn_hash(state);
        }
    }
}

impl fmt::Debug for CompositeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl AbstractState for CompositeState {
    fn location(&self) -> Option<Location> {
        self.iter().find_map(|state| state.location())
    }

    fn partition_key(&self) -> Option<PartitionKey> {
        PartitionKey::combine(self.iter().filter_map(|state| state.partition_key()))
    }

    fn is_target(&self) -> bool {
        self.iter().any(|state| state.is_target())
    }

    fn must_dump(&self) -> bool {
        self.iter().any(|state| state.must_dump())
    }

    fn avoidance_reason(&self) -> Option<String> {
        let reasons: Vec<String> = self
            .iter()
            .filter_map(|state| state.avoidance_reason())
            .collect();
        if reasons.is_empty() {
            None
        } else {
            Some(reasons.join("; "))
        }
    }

    fn assumptions(&self) -> Vec<Assumption> {
        self.iter().flat_map(|state| state.assumptions()).collect()
    }
}

/// Ordered tuple of component precisions.
#[derive(Clone)]
pub struct CompositePrecision {
    components: Arc<[ComponentPrecision]>,
}

impl CompositePrecision {
    pub(crate) fn from_components(components: Vec<ComponentPrecision>) -> Self {
        CompositePrecision {
            components: components.into(),
        }
    }

    pub(crate) fn component_arc(&self, index: usize) -> &ComponentPrecision {
        &self.components[index]
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Precision> {
        self.components.get(index).map(|precision| precision.as_ref())
    }

    /// The first component precision of type `T`.
    pub fn component<T: Precision>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|precision| precision.as_ref().downcast_ref::<T>())
    }
}

impl PartialEq for CompositePrecision {
    fn eq(&self, other: &Self) -> bool {
        self.components.len() == other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a.as_ref().precision_eq(b.as_ref().precision_as_any()))
    }
}

impl fmt::Debug for CompositePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.components.iter().map(|precision| precision.as_ref()))
            .finish()
    }
}
