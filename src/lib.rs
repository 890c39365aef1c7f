pub use tessera_cfa as cfa;
pub use tessera_cpa as cpa;

pub mod prelude {
    pub use tessera_cfa::{Cfa, CfaEdge, EdgeLabel, Location, NodeKind};
    pub use tessera_cpa::{
        AbstractDomain, AbstractState, AlgorithmConfig, Component, CompositeCpa,
        ConditionAdjustment, ConfigurableProgramAnalysis, CpaAlgorithm, CpaError, Exploration,
        HasBottom, HasTop, Lattice, LatticeDomain, LimitReason, LocationCpa, MergePolicy,
        StopPolicy, Successors, TransferRelation, Verdict,
    };
}
