use std::sync::Arc;

use smallvec::smallvec;
use tessera_cfa::{Cfa, CfaEdge, EdgeLabel, Location};
use tessera_cpa::{
    AbstractDomain, AbstractState, Action, Adjustment, ConfigurableProgramAnalysis, CpaError,
    EqualityDomain, HasBottom, HasTop, Lattice, LatticeDomain, MergePolicy, PartitionKey,
    ReachedView, Successors, TransferRelation,
};

/// Program counter plus error flag, shared by the fixture analyses that
/// track locations themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pc {
    pub location: Location,
    pub error: bool,
}

impl Pc {
    fn at(cfa: &Cfa, location: Location) -> Result<Self, CpaError> {
        Ok(Pc {
            location,
            error: cfa.try_node(location)?.is_error(),
        })
    }
}

/// Domain in which every state covers every other.
#[derive(Debug, Default)]
pub struct AlwaysCovered;

impl AbstractDomain for AlwaysCovered {
    type State = TrivialState;

    fn join(&self, _a: &TrivialState, b: &TrivialState) -> Result<TrivialState, CpaError> {
        Ok(*b)
    }

    fn is_less_or_equal(&self, _a: &TrivialState, _b: &TrivialState) -> Result<bool, CpaError> {
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrivialState(pub Pc);

impl AbstractState for TrivialState {
    fn location(&self) -> Option<Location> {
        Some(self.0.location)
    }

    fn partition_key(&self) -> Option<PartitionKey> {
        Some(PartitionKey::Location(self.0.location))
    }

    fn is_target(&self) -> bool {
        self.0.error
    }
}

/// Follows the automaton with a domain that covers everything.
#[derive(Debug)]
pub struct TrivialCpa {
    cfa: Arc<Cfa>,
    domain: AlwaysCovered,
}

impl TrivialCpa {
    pub fn new(cfa: Arc<Cfa>) -> Self {
        TrivialCpa {
            cfa,
            domain: AlwaysCovered,
        }
    }
}

impl TransferRelation for TrivialCpa {
    type State = TrivialState;
    type Precision = ();

    fn successors(
        &self,
        _state: &TrivialState,
        _precision: &(),
        edge: &CfaEdge,
    ) -> Result<Successors<TrivialState>, CpaError> {
        Ok(smallvec![TrivialState(Pc::at(&self.cfa, edge.target)?)])
    }
}

impl ConfigurableProgramAnalysis for TrivialCpa {
    type State = TrivialState;
    type Precision = ();
    type Domain = AlwaysCovered;
    type Transfer = Self;

    fn name(&self) -> &str {
        "trivial"
    }

    fn domain(&self) -> &AlwaysCovered {
        &self.domain
    }

    fn transfer_relation(&self) -> &Self {
        self
    }

    fn initial_state(&self, location: Location) -> Result<TrivialState, CpaError> {
        Ok(TrivialState(Pc::at(&self.cfa, location)?))
    }

    fn initial_precision(&self, _location: Location) -> Result<(), CpaError> {
        Ok(())
    }
}

/// Location plus the number of edges taken so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterState {
    pub pc: Pc,
    pub count: u32,
}

impl AbstractState for CounterState {
    fn location(&self) -> Option<Location> {
        Some(self.pc.location)
    }

    fn partition_key(&self) -> Option<PartitionKey> {
        Some(PartitionKey::Location(self.pc.location))
    }

    fn is_target(&self) -> bool {
        self.pc.error
    }
}

/// Counts taken edges and discards every successor whose count exceeds
/// `limit` during precision adjustment.
#[derive(Debug)]
pub struct CounterCpa {
    cfa: Arc<Cfa>,
    limit: u32,
    yield_at: Option<u32>,
    yield_always: bool,
    domain: EqualityDomain<CounterState>,
}

impl CounterCpa {
    pub fn new(cfa: Arc<Cfa>, limit: u32) -> Self {
        CounterCpa {
            cfa,
            limit,
            yield_at: None,
            yield_always: false,
            domain: EqualityDomain::new(),
        }
    }

    /// Answer [`Action::Break`] for the successor whose count is `count`.
    pub fn with_yield_at(mut self, count: u32) -> Self {
        self.yield_at = Some(count);
        self
    }

    /// Answer [`Action::Break`] for every successor within the limit.
    pub fn yielding(mut self) -> Self {
        self.yield_always = true;
        self
    }
}

impl TransferRelation for CounterCpa {
    type State = CounterState;
    type Precision = ();

    fn successors(
        &self,
        state: &CounterState,
        _precision: &(),
        edge: &CfaEdge,
    ) -> Result<Successors<CounterState>, CpaError> {
        Ok(smallvec![CounterState {
            pc: Pc::at(&self.cfa, edge.target)?,
            count: state.count + 1,
        }])
    }
}

impl ConfigurableProgramAnalysis for CounterCpa {
    type State = CounterState;
    type Precision = ();
    type Domain = EqualityDomain<CounterState>;
    type Transfer = Self;

    fn name(&self) -> &str {
        "counter"
    }

    fn domain(&self) -> &EqualityDomain<CounterState> {
        &self.domain
    }

    fn transfer_relation(&self) -> &Self {
        self
    }

    fn initial_state(&self, location: Location) -> Result<CounterState, CpaError> {
        Ok(CounterState {
            pc: Pc::at(&self.cfa, location)?,
            count: 0,
        })
    }

    fn initial_precision(&self, _location: Location) -> Result<(), CpaError> {
        Ok(())
    }

    fn precision_adjust(
        &self,
        state: &CounterState,
        precision: &(),
        _reached: &dyn ReachedView,
    ) -> Result<Adjustment<CounterState, ()>, CpaError> {
        let adjustment = Adjustment::unchanged(*state, *precision);
        if state.count > self.limit {
            Ok(adjustment.with_action(Action::Discard))
        } else if self.yield_always || self.yield_at == Some(state.count) {
            Ok(adjustment.with_action(Action::Break))
        } else {
            Ok(adjustment)
        }
    }
}

/// Parity of a single variable `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    Bottom,
    Even,
    Odd,
    Top,
}

impl Lattice for Parity {
    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Parity::Bottom, x) | (x, Parity::Bottom) => *x,
            (a, b) if a == b => *a,
            _ => Parity::Top,
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Parity::Top, x) | (x, Parity::Top) => *x,
            (a, b) if a == b => *a,
            _ => Parity::Bottom,
        }
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        self.join(other) == *other
    }
}

impl HasBottom for Parity {
    fn bottom() -> Self {
        Parity::Bottom
    }
}

impl HasTop for Parity {
    fn top() -> Self {
        Parity::Top
    }
}

impl AbstractState for Parity {}

/// Tracks the parity of `x` through `x = 0`, `x += 1` and `havoc`; joins on
/// arrival. Has no location: compose it with
/// [`LocationCpa`](tessera_cpa::LocationCpa).
#[derive(Debug, Default)]
pub struct ParityCpa {
    domain: LatticeDomain<Parity>,
}

impl TransferRelation for ParityCpa {
    type State = Parity;
    type Precision = ();

    fn successors(
        &self,
        state: &Parity,
        _precision: &(),
        edge: &CfaEdge,
    ) -> Result<Successors<Parity>, CpaError> {
        if *state == Parity::Bottom {
            return Ok(Successors::new());
        }
        let next = match &edge.label {
            EdgeLabel::Statement(text) => match &**text {
                "x = 0" => smallvec![Parity::Even],
                "x += 1" => smallvec![match state {
                    Parity::Even => Parity::Odd,
                    Parity::Odd => Parity::Even,
                    other => *other,
                }],
                "havoc" => smallvec![Parity::Top],
                _ => smallvec![*state],
            },
            _ => smallvec![*state],
        };
        Ok(next)
    }
}

impl ConfigurableProgramAnalysis for ParityCpa {
    type State = Parity;
    type Precision = ();
    type Domain = LatticeDomain<Parity>;
    type Transfer = Self;

    fn name(&self) -> &str {
        "parity"
    }

    fn domain(&self) -> &LatticeDomain<Parity> {
        &self.domain
    }

    fn transfer_relation(&self) -> &Self {
        self
    }

    fn initial_state(&self, _location: Location) -> Result<Parity, CpaError> {
        Ok(Parity::Top)
    }

    fn initial_precision(&self, _location: Location) -> Result<(), CpaError> {
        Ok(())
    }

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::Join
    }
}

/// Number of edges taken, and whether that went past the bound in force
/// when the state was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    pub depth: u32,
    pub exceeded: bool,
}

impl AbstractState for DepthState {
    fn must_dump(&self) -> bool {
        self.exceeded
    }

    fn avoidance_reason(&self) -> Option<String> {
        self.exceeded
            .then(|| format!("depth {} exceeds the bound", self.depth))
    }
}

/// Bounds exploration depth. States past the bound are flagged for
/// dumping; [`adjust_precision`](ConfigurableProgramAnalysis::adjust_precision)
/// doubles the bound until it reaches `max_bound`.
#[derive(Debug)]
pub struct DepthBoundCpa {
    bound: u32,
    max_bound: u32,
    domain: EqualityDomain<DepthState>,
}

impl DepthBoundCpa {
    pub fn new(bound: u32, max_bound: u32) -> Self {
        DepthBoundCpa {
            bound,
            max_bound,
            domain: EqualityDomain::new(),
        }
    }

    pub fn bound(&self) -> u32 {
        self.bound
    }
}

impl TransferRelation for DepthBoundCpa {
    type State = DepthState;
    type Precision = ();

    fn successors(
        &self,
        state: &DepthState,
        _precision: &(),
        _edge: &CfaEdge,
    ) -> Result<Successors<DepthState>, CpaError> {
        let depth = state.depth + 1;
        Ok(smallvec![DepthState {
            depth,
            exceeded: depth > self.bound,
        }])
    }
}

impl ConfigurableProgramAnalysis for DepthBoundCpa {
    type State = DepthState;
    type Precision = ();
    type Domain = EqualityDomain<DepthState>;
    type Transfer = Self;

    fn name(&self) -> &str {
        "depth-bound"
    }

    fn domain(&self) -> &EqualityDomain<DepthState> {
        &self.domain
    }

    fn transfer_relation(&self) -> &Self {
        self
    }

    fn initial_state(&self, _location: Location) -> Result<DepthState, CpaError> {
        Ok(DepthState {
            depth: 0,
            exceeded: false,
        })
    }

    fn initial_precision(&self, _location: Location) -> Result<(), CpaError> {
        Ok(())
    }

    fn adjust_precision(&mut self) -> Result<bool, CpaError> {
        if self.bound >= self.max_bound {
            return Ok(false);
        }
        self.bound = (self.bound * 2).clamp(1, self.max_bound);
        Ok(true)
    }
}
