use std::sync::Arc;

use smallvec::smallvec;
use tessera_cfa::{Cfa, CfaEdge, Location};

use crate::{
    AbstractState, ConfigurableProgramAnalysis, CpaError, EqualityDomain, PartitionKey,
    Successors, TransferRelation,
};

/// Program-counter state: where control currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationState {
    location: Location,
    is_error: bool,
}

impl AbstractState for LocationState {
    fn location(&self) -> Option<Location> {
        Some(self.location)
    }

    fn partition_key(&self) -> Option<PartitionKey> {
        Some(PartitionKey::Location(self.location))
    }

    fn is_target(&self) -> bool {
        self.is_error
    }
}

/// Tracks the program counter over a [`Cfa`] and flags error locations as
/// targets. Every other analysis is usually composed with this one.
#[derive(Debug)]
pub struct LocationCpa {
    cfa: Arc<Cfa>,
    domain: EqualityDomain<LocationState>,
}

impl LocationCpa {
    pub fn new(cfa: Arc<Cfa>) -> Self {
        LocationCpa {
            cfa,
            domain: EqualityDomain::new(),
        }
    }

    pub fn cfa(&self) -> &Arc<Cfa> {
        &self.cfa
    }

    fn state_at(&self, location: Location) -> Result<LocationState, CpaError> {
        let node = self.cfa.try_node(location)?;
        Ok(LocationState {
            location,
            is_error: node.is_error(),
        })
    }
}

impl TransferRelation for LocationCpa {
    type State = LocationState;
    type Precision = ();

    fn successors(
        &self,
        state: &LocationState,
        _precision: &(),
        edge: &CfaEdge,
    ) -> Result<Successors<LocationState>, CpaError> {
        if edge.source != state.location {
            return Err(CpaError::transfer(
                "location",
                edge,
                format!("edge does not leave {}", state.location),
            ));
        }
        Ok(smallvec![self.state_at(edge.target)?])
    }
}

impl ConfigurableProgramAnalysis for LocationCpa {
    type State = LocationState;
    type Precision = ();
    type Domain = EqualityDomain<LocationState>;
    type Transfer = Self;

    fn name(&self) -> &str {
        "location"
    }

    fn domain(&self) -> &EqualityDomain<LocationState> {
        &self.domain
    }

    fn transfer_relation(&self) -> &Self {
        self
    }

    fn initial_state(&self, location: Location) -> Result<LocationState, CpaError> {
        self.state_at(location)
    }

    fn initial_precision(&self, _location: Location) -> Result<(), CpaError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tessera_cfa::{EdgeLabel, NodeKind};

    use super::*;

    fn line() -> (Arc<Cfa>, Location, Location) {
        let mut builder = Cfa::builder();
        let entry = builder.add_node(NodeKind::Entry);
        let error = builder.add_node(NodeKind::Error);
        builder
            .add_edge(entry, error, EdgeLabel::statement("fail()"))
            .unwrap();
        (Arc::new(builder.build().unwrap()), entry, error)
    }

    #[test]
    fn test_follows_edge_target() {
        let (cfa, entry, error) = line();
        let cpa = LocationCpa::new(cfa.clone());
        let initial = cpa.initial_state(entry).unwrap();
        assert!(!initial.is_target());

        let edge = cfa.outgoing(entry)[0];
        let next = cpa.successors(&initial, &(), edge).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].location(), Some(error));
        assert!(next[0].is_target());
        assert_eq!(
            next[0].partition_key(),
            Some(PartitionKey::Location(error))
        );
    }

    #[test]
    fn test_rejects_foreign_edge() {
        let (cfa, entry, error) = line();
        let cpa = LocationCpa::new(cfa.clone());
        let edge = cfa.outgoing(entry)[0];
        let stranded = cpa.initial_state(error).unwrap();
        let err = cpa.successors(&stranded, &(), edge).unwrap_err();
        assert!(matches!(err, CpaError::Transfer { .. }));
    }
}
