use std::hash::Hash;

/// Raw slot index. Only an [`Arena`](crate::Arena) hands these out.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(pub(crate) usize);

impl Id {
    pub fn raw(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed wrapper around [`Id`]; declare one with [`identifier!`](crate::identifier).
pub trait Identifier:
    Sized + Clone + Copy + Hash + std::fmt::Debug + PartialEq + Eq + Ord + From<Id> + Into<Id>
{
}

/// Declare a typed identifier wrapping an arena [`Id`].
#[macro_export]
macro_rules! identifier {
    ($(#[$attr:meta])* $vis:vis struct $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name($crate::Id);

        impl From<$crate::Id> for $name {
            fn from(value: $crate::Id) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $crate::Id {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl $name {
            /// The slot index behind this identifier.
            pub fn raw(self) -> usize {
                self.0.raw()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $crate::Identifier for $name {}
    };
}
