use std::sync::Arc;

use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex};
use smallvec::SmallVec;

use crate::{CfaEdge, CfaError, CfaNode, EdgeId, EdgeLabel, Location, NodeKind};

/// An immutable control-flow automaton.
#[derive(Clone, Debug)]
pub struct Cfa {
    graph: DiGraph<CfaNode, CfaEdge>,
    entry: Location,
}

impl Cfa {
    pub fn builder() -> CfaBuilder {
        CfaBuilder::default()
    }

    pub fn entry(&self) -> Location {
        self.entry
    }

    pub fn node(&self, location: Location) -> Option<&CfaNode> {
        self.graph.node_weight(location.index())
    }

    /// Look up a location, failing with [`CfaError::UnknownLocation`].
    pub fn try_node(&self, location: Location) -> Result<&CfaNode, CfaError> {
        self.node(location)
            .ok_or(CfaError::UnknownLocation(location))
    }

    pub fn edge(&self, id: EdgeId) -> Option<&CfaEdge> {
        self.graph.edge_weight(EdgeIndex::new(id.raw()))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CfaNode> {
        self.graph.node_weights()
    }

    /// Outgoing edges of `location` in insertion order.
    pub fn outgoing(&self, location: Location) -> SmallVec<[&CfaEdge; 2]> {
        self.sorted_edges(location, Direction::Outgoing)
    }

    /// Incoming edges of `location` in insertion order.
    pub fn incoming(&self, location: Location) -> SmallVec<[&CfaEdge; 2]> {
        self.sorted_edges(location, Direction::Incoming)
    }

    /// The first edge (by insertion order) leading from `source` to `target`.
    pub fn edge_between(&self, source: Location, target: Location) -> Option<&CfaEdge> {
        self.outgoing(source)
            .into_iter()
            .find(|edge| edge.target == target)
    }

    pub fn error_locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.nodes()
            .filter(|node| node.is_error())
            .map(|node| node.location)
    }

    fn sorted_edges(&self, location: Location, direction: Direction) -> SmallVec<[&CfaEdge; 2]> {
        if self.node(location).is_none() {
            return SmallVec::new();
        }
        // petgraph yields adjacency newest-first
        let mut edges: SmallVec<[&CfaEdge; 2]> = self
            .graph
            .edges_directed(location.index(), direction)
            .map(|edge| edge.weight())
            .collect();
        edges.sort_by_key(|edge| edge.id);
        edges
    }
}

/// Incremental constructor for a [`Cfa`].
#[derive(Debug, Default)]
pub struct CfaBuilder {
    graph: DiGraph<CfaNode, CfaEdge>,
    entry: Option<Location>,
}

#[bon::bon]
impl CfaBuilder {
    /// Add a node; the finishing call returns its [`Location`].
    #[builder(finish_fn = add)]
    pub fn node(
        &mut self,
        /// What role this location plays.
        kind: NodeKind,
        /// Human-readable name, used in diagnostics only.
        #[builder(into)]
        label: Option<Arc<str>>,
    ) -> Location {
        let location = Location::from(petgraph::graph::NodeIndex::new(self.graph.node_count()));
        let index = self.graph.add_node(CfaNode {
            location,
            kind,
            label,
        });
        debug_assert_eq!(Location::from(index), location);
        location
    }
}

impl CfaBuilder {
    pub fn add_node(&mut self, kind: NodeKind) -> Location {
        self.node().kind(kind).add()
    }

    pub fn add_edge(
        &mut self,
        source: Location,
        target: Location,
        label: EdgeLabel,
    ) -> Result<EdgeId, CfaError> {
        for location in [source, target] {
            if self.graph.node_weight(location.index()).is_none() {
                return Err(CfaError::UnknownLocation(location));
            }
        }
        let id = EdgeId::from(EdgeIndex::new(self.graph.edge_count()));
        self.graph.add_edge(
            source.index(),
            target.index(),
            CfaEdge {
                id,
                source,
                target,
                label,
            },
        );
        Ok(id)
    }

    /// Choose the entry explicitly instead of the first [`NodeKind::Entry`] node.
    pub fn entry(&mut self, location: Location) -> &mut Self {
        self.entry = Some(location);
        self
    }

    pub fn build(self) -> Result<Cfa, CfaError> {
        let entry = match self.entry {
            Some(location) => {
                let node = self
                    .graph
                    .node_weight(location.index())
                    .ok_or(CfaError::UnknownLocation(location))?;
                if node.kind != NodeKind::Entry {
                    return Err(CfaError::EntryKindMismatch(location));
                }
                location
            }
            None => self
                .graph
                .node_weights()
                .find(|node| node.kind == NodeKind::Entry)
                .map(|node| node.location)
                .ok_or(CfaError::MissingEntry)?,
        };
        Ok(Cfa {
            graph: self.graph,
            entry,
        })
    }
}
