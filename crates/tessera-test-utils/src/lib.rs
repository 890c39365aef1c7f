pub mod cfa;
pub mod laws;
mod analyses;

pub use analyses::{
    AlwaysCovered, CounterCpa, CounterState, DepthBoundCpa, DepthState, Parity, ParityCpa, Pc,
    TrivialCpa, TrivialState,
};

