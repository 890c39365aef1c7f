//! Configurable program analysis: a generic reachability engine.
//!
//! An analysis plugs in through [`ConfigurableProgramAnalysis`], which bundles
//! an [`AbstractDomain`], a [`TransferRelation`], merge and stop operators and
//! a precision-adjustment hook. Several analyses are combined with
//! [`CompositeCpa`]. [`CpaAlgorithm`] explores the abstract state space over a
//! control-flow automaton, recording states in a [`ReachedSet`] and their
//! provenance in an [`Arg`], and [`ConditionAdjustment`] relaxes precision
//! and prunes stale states when a run hits a limit.

mod adjustment;
mod algorithm;
mod arg;
mod composite;
mod cpa;
mod domain;
mod error;
mod exploration;
mod lattice;
mod location;
mod operator;
mod precision;
mod reached;
mod state;
mod transfer;

pub use adjustment::{ConditionAdjustment, PruneSummary, prune_flagged};
pub use algorithm::{
    AlgorithmConfig, AlgorithmStatistics, CpaAlgorithm, Expansion, ExplorationOf, LimitReason,
    Phase, ShutdownNotifier, Step, Verdict,
};
pub use arg::{Arg, ArgNode, ArgPath, Detached, StateId};
pub use composite::{Component, CompositeCpa, CompositePrecision, CompositeState};
pub use cpa::ConfigurableProgramAnalysis;
pub use domain::{AbstractDomain, EqualityDomain, LatticeDomain};
pub use error::CpaError;
pub use exploration::Exploration;
pub use lattice::{HasBottom, HasTop, Lattice};
pub use location::{LocationCpa, LocationState};
pub use operator::{MergePolicy, StopPolicy, covering_index};
pub use precision::{Action, Adjustment, ReachedView};
pub use reached::{ReachedEntry, ReachedSet, TraversalOrder};
pub use state::{AbstractState, Assumption, DynState, PartitionKey, Precision, partition_of};
pub use transfer::{Successors, TransferRelation};

pub use smallvec::{self, SmallVec};
