use std::sync::Arc;

use tessera_cfa::{Cfa, CfaEdge, EdgeLabel, Location, NodeKind};
use tessera_cpa::smallvec::smallvec;
use tessera_cpa::{
    AbstractDomain, AbstractState, AlgorithmConfig, CompositeCpa, CompositeState,
    ConditionAdjustment, ConfigurableProgramAnalysis, CpaAlgorithm, CpaError, LimitReason,
    LocationCpa, Successors, TransferRelation, Verdict,
};
use tessera_test_utils::cfa::{counting_loop, diamond, straight_line};
use tessera_test_utils::laws::assert_cpa_laws;
use tessera_test_utils::{DepthBoundCpa, DepthState, Parity, ParityCpa};
use test_log::test;

fn location_and_depth(cfa: &Arc<Cfa>, bound: u32, max_bound: u32) -> CompositeCpa {
    CompositeCpa::new(vec![
        LocationCpa::new(cfa.clone()).into(),
        DepthBoundCpa::new(bound, max_bound).into(),
    ])
    .unwrap()
}

fn location_and_parity(cfa: &Arc<Cfa>) -> CompositeCpa {
    CompositeCpa::new(vec![
        LocationCpa::new(cfa.clone()).into(),
        ParityCpa::default().into(),
    ])
    .unwrap()
}

#[test]
fn test_one_relaxation_finishes_a_short_line() {
    let (cfa, locations) = straight_line(4);
    let algorithm = CpaAlgorithm::new(location_and_depth(&cfa, 2, 8), cfa);
    let mut driver = ConditionAdjustment::new(algorithm);
    let mut exploration = driver.algorithm().initial_exploration().unwrap();

    let verdict = driver.run(&mut exploration).unwrap();
    assert_eq!(verdict, Verdict::Exhausted);
    assert_eq!(driver.rounds(), 1);
    assert_eq!(exploration.len(), 5);

    let mut reached: Vec<Location> = exploration
        .reached()
        .states()
        .filter_map(AbstractState::location)
        .collect();
    reached.sort();
    assert_eq!(reached, locations);
    assert!(exploration.reached().states().all(|s| !s.must_dump()));
    exploration.check_consistency();
}

#[test]
fn test_unbounded_loop_gives_up_at_the_maximum_bound() {
    let fixture = counting_loop(false);
    let algorithm = CpaAlgorithm::new(location_and_depth(&fixture.cfa, 2, 8), fixture.cfa.clone());
    let mut driver = ConditionAdjustment::new(algorithm);
    let mut exploration = driver.algorithm().initial_exploration().unwrap();

    let verdict = driver.run(&mut exploration).unwrap();
    assert_eq!(
        verdict,
        Verdict::LimitReached(LimitReason::PrecisionLimit { dumped: 1 })
    );
    assert_eq!(driver.rounds(), 2);

    let dumped: Vec<&CompositeState> = exploration
        .reached()
        .states()
        .filter(|s| s.must_dump())
        .collect();
    assert_eq!(dumped.len(), 1);
    assert_eq!(dumped[0].location(), Some(fixture.head));
    assert_eq!(
        dumped[0].component::<DepthState>().map(|d| d.depth),
        Some(9)
    );
    assert_eq!(
        dumped[0].avoidance_reason().as_deref(),
        Some("depth 9 exceeds the bound")
    );
    exploration.check_consistency();
}

#[test]
fn test_parity_loop_terminates_by_joining_at_the_head() {
    let fixture = counting_loop(false);
    let mut algorithm = CpaAlgorithm::new(location_and_parity(&fixture.cfa), fixture.cfa.clone());
    let mut exploration = algorithm.initial_exploration().unwrap();

    assert_eq!(algorithm.run(&mut exploration).unwrap(), Verdict::Exhausted);
    assert!(algorithm.statistics().merged > 0);

    let at_head: Vec<&CompositeState> = exploration
        .reached()
        .states()
        .filter(|s| s.location() == Some(fixture.head))
        .collect();
    assert_eq!(at_head.len(), 1);
    assert_eq!(at_head[0].component::<Parity>(), Some(&Parity::Top));
    exploration.check_consistency();
}

#[test]
fn test_parity_loop_with_error_edge_finds_the_target() {
    let fixture = counting_loop(true);
    let mut algorithm = CpaAlgorithm::new(location_and_parity(&fixture.cfa), fixture.cfa.clone());
    let mut exploration = algorithm.initial_exploration().unwrap();

    assert_eq!(algorithm.run(&mut exploration).unwrap(), Verdict::TargetFound);
    let target = exploration.targets().next().unwrap();
    let state = exploration.reached().state(target).unwrap();
    assert_eq!(state.location(), fixture.error);
    assert_eq!(state.component::<Parity>(), Some(&Parity::Top));
}

#[test]
fn test_composite_operators_are_lawful() {
    let fixture = diamond();
    let location = LocationCpa::new(fixture.cfa.clone());
    let composite = location_and_parity(&fixture.cfa);

    let mut samples = Vec::new();
    for at in [fixture.entry, fixture.join] {
        for parity in [Parity::Bottom, Parity::Even, Parity::Odd, Parity::Top] {
            let state = composite
                .compose_state(vec![
                    Arc::new(location.initial_state(at).unwrap()) as Arc<dyn AbstractState>,
                    Arc::new(parity) as Arc<dyn AbstractState>,
                ])
                .unwrap();
            samples.push(state);
        }
    }
    let precision = composite.initial_precision(fixture.entry).unwrap();
    assert_cpa_laws(&composite, &samples, &precision);
}

/// Value of `x`: `None` is unknown. `stale` marks a value the analysis gave
/// up on while coarse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Value {
    known: Option<i64>,
    stale: bool,
}

impl AbstractState for Value {
    fn must_dump(&self) -> bool {
        self.stale
    }
}

#[derive(Debug, Default)]
struct ValueDomain;

impl AbstractDomain for ValueDomain {
    type State = Value;

    fn join(&self, a: &Value, b: &Value) -> Result<Value, CpaError> {
        if a == b {
            return Ok(*a);
        }
        Ok(Value {
            known: None,
            stale: a.stale || b.stale,
        })
    }

    fn is_less_or_equal(&self, a: &Value, b: &Value) -> Result<bool, CpaError> {
        Ok(b.known.is_none() || a == b)
    }
}

/// Constant propagation for `x` that, while coarse, forgets the value 5.
#[derive(Debug)]
struct ForgetfulConstant {
    coarse: bool,
    domain: ValueDomain,
}

impl TransferRelation for ForgetfulConstant {
    type State = Value;
    type Precision = ();

    fn successors(
        &self,
        state: &Value,
        _precision: &(),
        edge: &CfaEdge,
    ) -> Result<Successors<Value>, CpaError> {
        match &edge.label {
            EdgeLabel::Statement(text) => {
                let Some(n) = text.strip_prefix("x = ").and_then(|n| n.parse::<i64>().ok()) else {
                    return Ok(smallvec![*state]);
                };
                if self.coarse && n == 5 {
                    Ok(smallvec![Value {
                        known: None,
                        stale: true,
                    }])
                } else {
                    Ok(smallvec![Value {
                        known: Some(n),
                        stale: false,
                    }])
                }
            }
            EdgeLabel::Assume { condition, truth } => {
                let tested = condition
                    .strip_prefix("x == ")
                    .and_then(|n| n.parse::<i64>().ok());
                match (tested, state.known) {
                    (Some(n), Some(x)) if (x == n) != *truth => Ok(Successors::new()),
                    _ => Ok(smallvec![*state]),
                }
            }
            _ => Ok(smallvec![*state]),
        }
    }
}

impl ConfigurableProgramAnalysis for ForgetfulConstant {
    type State = Value;
    type Precision = ();
    type Domain = ValueDomain;
    type Transfer = Self;

    fn name(&self) -> &str {
        "forgetful-constant"
    }

    fn domain(&self) -> &ValueDomain {
        &self.domain
    }

    fn transfer_relation(&self) -> &Self {
        self
    }

    fn initial_state(&self, _location: Location) -> Result<Value, CpaError> {
        Ok(Value {
            known: None,
            stale: false,
        })
    }

    fn initial_precision(&self, _location: Location) -> Result<(), CpaError> {
        Ok(())
    }

    fn adjust_precision(&mut self) -> Result<bool, CpaError> {
        Ok(std::mem::replace(&mut self.coarse, false))
    }
}

/// ```text
/// entry -> p1 -x = 5-> join
/// entry -> p2 -x = 1-> join
/// join -[x == 1]-> error
/// join -[!(x == 1)]-> exit
/// ```
fn two_assignments_into_a_check() -> Arc<Cfa> {
    let mut builder = Cfa::builder();
    let entry = builder.add_node(NodeKind::Entry);
    let p1 = builder.add_node(NodeKind::Regular);
    let p2 = builder.add_node(NodeKind::Regular);
    let join = builder.add_node(NodeKind::Regular);
    let error = builder.add_node(NodeKind::Error);
    let exit = builder.add_node(NodeKind::Exit);
    builder.add_edge(entry, p1, EdgeLabel::Blank).unwrap();
    builder.add_edge(entry, p2, EdgeLabel::Blank).unwrap();
    builder
        .add_edge(p1, join, EdgeLabel::statement("x = 5"))
        .unwrap();
    builder
        .add_edge(p2, join, EdgeLabel::statement("x = 1"))
        .unwrap();
    builder
        .add_edge(join, error, EdgeLabel::assume("x == 1", true))
        .unwrap();
    builder
        .add_edge(join, exit, EdgeLabel::assume("x == 1", false))
        .unwrap();
    Arc::new(builder.build().unwrap())
}

#[test]
fn test_pruned_coverer_requeues_the_parents_it_covered() {
    for keep_covered_in_arg in [true, false] {
        let cfa = two_assignments_into_a_check();
        let cpa = CompositeCpa::new(vec![
            LocationCpa::new(cfa.clone()).into(),
            ForgetfulConstant {
                coarse: true,
                domain: ValueDomain,
            }
            .into(),
        ])
        .unwrap();
        let config = AlgorithmConfig::builder()
            .keep_covered_in_arg(keep_covered_in_arg)
            .build();
        let algorithm = CpaAlgorithm::new(cpa, cfa).with_config(config);
        let mut driver = ConditionAdjustment::new(algorithm);
        let mut exploration = driver.algorithm().initial_exploration().unwrap();

        // x = 1 at the join is covered by the forgotten x = 5
        let first = driver.algorithm_mut().run(&mut exploration).unwrap();
        assert_eq!(
            first,
            Verdict::LimitReached(LimitReason::PrecisionLimit { dumped: 1 })
        );
        assert_eq!(driver.algorithm().statistics().covered, 1);
        assert_eq!(
            exploration.arg().iter().any(|(_, node)| node.is_covered()),
            keep_covered_in_arg
        );

        let verdict = driver.run(&mut exploration).unwrap();
        assert_eq!(verdict, Verdict::TargetFound, "keep_covered_in_arg = {keep_covered_in_arg}");
        assert_eq!(driver.rounds(), 1);
        exploration.check_consistency();
    }
}
