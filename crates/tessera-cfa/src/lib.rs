//! Control-flow automaton consumed by the reachability engine.
//!
//! A [`Cfa`] is a directed graph whose nodes are program [`Location`]s and
//! whose edges carry an [`EdgeLabel`] describing the operation performed when
//! control moves along them. The engine never interprets labels itself; they
//! are handed to each analysis' transfer relation.

mod cfa;
mod edge;
mod error;
mod node;

pub use cfa::{Cfa, CfaBuilder};
pub use edge::{CfaEdge, EdgeId, EdgeLabel};
pub use error::CfaError;
pub use node::{CfaNode, Location, NodeKind};
