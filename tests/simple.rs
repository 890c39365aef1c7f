use std::sync::Arc;

use tessera::cpa::smallvec::smallvec;
use tessera::prelude::*;
use test_log::test;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Constant {
    Bottom,
    Known(i64),
    Top,
}

impl Lattice for Constant {
    fn is_subseteq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Constant::Bottom, _) | (_, Constant::Top)
        ) || self == other
    }

    fn join(&self, other: &Self) -> Self {
        if self.is_subseteq(other) {
            *other
        } else if other.is_subseteq(self) {
            *self
        } else {
            Constant::Top
        }
    }

    fn meet(&self, other: &Self) -> Self {
        if self.is_subseteq(other) {
            *self
        } else if other.is_subseteq(self) {
            *other
        } else {
            Constant::Bottom
        }
    }
}

impl HasBottom for Constant {
    fn bottom() -> Self {
        Constant::Bottom
    }
}

impl HasTop for Constant {
    fn top() -> Self {
        Constant::Top
    }
}

impl AbstractState for Constant {}

/// Value of `x` under `x = <n>` and `[x == <n>]`.
#[derive(Debug, Default)]
pub struct ConstantCpa {
    domain: LatticeDomain<Constant>,
}

fn literal(text: &str, prefix: &str) -> Option<i64> {
    text.strip_prefix(prefix)?.trim().parse().ok()
}

impl TransferRelation for ConstantCpa {
    type State = Constant;
    type Precision = ();

    fn successors(
        &self,
        state: &Constant,
        _precision: &(),
        edge: &CfaEdge,
    ) -> Result<Successors<Constant>, CpaError> {
        match &edge.label {
            EdgeLabel::Statement(text) => Ok(match literal(text, "x =") {
                Some(n) => smallvec![Constant::Known(n)],
                None => smallvec![Constant::Top],
            }),
            EdgeLabel::Assume { condition, truth } => {
                let feasible = match (literal(condition, "x =="), state) {
                    (Some(n), Constant::Known(x)) => (n == *x) == *truth,
                    (_, Constant::Bottom) => false,
                    _ => true,
                };
                Ok(if feasible {
                    smallvec![*state]
                } else {
                    Successors::new()
                })
            }
            _ => Ok(smallvec![*state]),
        }
    }
}

impl ConfigurableProgramAnalysis for ConstantCpa {
    type State = Constant;
    type Precision = ();
    type Domain = LatticeDomain<Constant>;
    type Transfer = Self;

    fn name(&self) -> &str {
        "constant"
    }

    fn domain(&self) -> &LatticeDomain<Constant> {
        &self.domain
    }

    fn transfer_relation(&self) -> &Self {
        self
    }

    fn initial_state(&self, _location: Location) -> Result<Constant, CpaError> {
        Ok(Constant::Top)
    }

    fn initial_precision(&self, _location: Location) -> Result<(), CpaError> {
        Ok(())
    }

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::Join
    }
}

/// `x = <assigned>; if (x == 2) error();`
fn guarded_error(assigned: i64) -> Arc<Cfa> {
    let mut builder = Cfa::builder();
    let entry = builder.add_node(NodeKind::Entry);
    let check = builder.add_node(NodeKind::Regular);
    let error = builder.node().kind(NodeKind::Error).label("error").add();
    let exit = builder.add_node(NodeKind::Exit);
    builder
        .add_edge(entry, check, EdgeLabel::statement(format!("x = {assigned}")))
        .unwrap();
    builder
        .add_edge(check, error, EdgeLabel::assume("x == 2", true))
        .unwrap();
    builder
        .add_edge(check, exit, EdgeLabel::assume("x == 2", false))
        .unwrap();
    Arc::new(builder.build().unwrap())
}

fn analyse(cfa: Arc<Cfa>) -> (Verdict, usize) {
    let composite = CompositeCpa::new(vec![
        LocationCpa::new(cfa.clone()).into(),
        ConstantCpa::default().into(),
    ])
    .unwrap();
    let mut driver = ConditionAdjustment::new(CpaAlgorithm::new(composite, cfa));
    let mut exploration = driver.algorithm().initial_exploration().unwrap();
    let verdict = driver.run(&mut exploration).unwrap();
    exploration.check_consistency();
    (verdict, exploration.len())
}

#[test]
fn test_infeasible_guard_keeps_error_unreachable() {
    let (verdict, reached) = analyse(guarded_error(1));
    assert_eq!(verdict, Verdict::Exhausted);
    assert_eq!(reached, 3);
}

#[test]
fn test_feasible_guard_reaches_error() {
    let (verdict, _) = analyse(guarded_error(2));
    assert_eq!(verdict, Verdict::TargetFound);
}

#[test]
fn test_unknown_value_reaches_error() {
    let mut builder = Cfa::builder();
    let entry = builder.add_node(NodeKind::Entry);
    let error = builder.add_node(NodeKind::Error);
    builder
        .add_edge(entry, error, EdgeLabel::assume("x == 2", true))
        .unwrap();
    let (verdict, reached) = analyse(Arc::new(builder.build().unwrap()));
    assert_eq!(verdict, Verdict::TargetFound);
    assert_eq!(reached, 2);
}
