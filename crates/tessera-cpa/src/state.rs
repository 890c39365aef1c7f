use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tessera_cfa::Location;

/// Object-safe equality and hashing for abstract states.
///
/// Implemented for every `Any + Eq + Hash + Send + Sync` type, so analyses
/// only derive the usual traits.
pub trait DynState: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn Any) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T: Any + Eq + Hash + Send + Sync> DynState for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| other == self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// An abstract state produced by one analysis.
///
/// Every capability query has a default, so a state only answers the ones its
/// analysis cares about. The engine reads them to partition the reached set,
/// decide termination and drive condition adjustment.
pub trait AbstractState: DynState + fmt::Debug {
    /// The program location this state is at, if the analysis tracks it.
    fn location(&self) -> Option<Location> {
        None
    }

    /// Bucket for merge and stop lookups; `None` means no opinion.
    fn partition_key(&self) -> Option<PartitionKey> {
        None
    }

    /// Whether this state represents the search target.
    fn is_target(&self) -> bool {
        false
    }

    /// Whether this state only marks a precision limit and must not be
    /// expanded. Such states are pruned by condition adjustment.
    fn must_dump(&self) -> bool {
        false
    }

    /// Why exploration was cut short at this state, for diagnostics.
    fn avoidance_reason(&self) -> Option<String> {
        None
    }

    /// Facts the analysis assumed without proof when producing this state.
    fn assumptions(&self) -> Vec<Assumption> {
        Vec::new()
    }
}

impl dyn AbstractState + '_ {
    pub fn downcast_ref<T: AbstractState>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: AbstractState>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// The partition a state belongs to, [`PartitionKey::Global`] when the state
/// has no opinion.
pub fn partition_of<S: AbstractState + ?Sized>(state: &S) -> PartitionKey {
    state.partition_key().unwrap_or(PartitionKey::Global)
}

/// Key used to bucket reached states.
///
/// Two states are only ever merged or compared if their keys are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PartitionKey {
    /// The single partition shared by states without a key.
    Global,
    Location(Location),
    Value(i64),
    Name(Arc<str>),
    /// Keys contributed by several components, in component order.
    Tuple(Arc<[PartitionKey]>),
}

impl PartitionKey {
    /// Combine keys reported by several components.
    ///
    /// No key yields `None`, a single key is passed through, anything else
    /// becomes a [`PartitionKey::Tuple`].
    pub fn combine(keys: impl IntoIterator<Item = PartitionKey>) -> Option<PartitionKey> {
        let mut keys: Vec<PartitionKey> = keys.into_iter().collect();
        match keys.len() {
            0 => None,
            1 => keys.pop(),
            _ => Some(PartitionKey::Tuple(keys.into())),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionKey::Global => write!(f, "*"),
            PartitionKey::Location(location) => write!(f, "{location}"),
            PartitionKey::Value(value) => write!(f, "{value}"),
            PartitionKey::Name(name) => write!(f, "{name}"),
            PartitionKey::Tuple(keys) => {
                write!(f, "(")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A condition an analysis assumed to hold.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assumption {
    pub location: Option<Location>,
    pub condition: Arc<str>,
}

impl Assumption {
    pub fn new(location: Option<Location>, condition: impl Into<Arc<str>>) -> Self {
        Assumption {
            location,
            condition: condition.into(),
        }
    }
}

/// Per-analysis tunable threaded alongside every abstract state.
///
/// Implemented for every `Clone + Debug + PartialEq + Send + Sync` type.
pub trait Precision: Any + fmt::Debug + Send + Sync {
    fn precision_as_any(&self) -> &dyn Any;
    fn precision_eq(&self, other: &dyn Any) -> bool;
}

impl<T: Any + fmt::Debug + PartialEq + Send + Sync> Precision for T {
    fn precision_as_any(&self) -> &dyn Any {
        self
    }

    fn precision_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| other == self)
    }
}

impl dyn Precision + '_ {
    pub fn downcast_ref<T: Precision>(&self) -> Option<&T> {
        self.precision_as_any().downcast_ref::<T>()
    }
}
