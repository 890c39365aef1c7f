use crate::Location;

/// Error type for automaton construction and lookup.
#[derive(Debug, thiserror::Error)]
pub enum CfaError {
    /// `build` was called before an entry location was chosen.
    #[error("control-flow automaton has no entry location")]
    MissingEntry,
    /// A location does not belong to this automaton.
    #[error("unknown location {0}")]
    UnknownLocation(Location),
    /// The entry location was declared with a non-entry kind.
    #[error("entry location {0} is not an entry node")]
    EntryKindMismatch(Location),
}
