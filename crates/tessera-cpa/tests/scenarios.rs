use tessera_cfa::{CfaEdge, Location};
use tessera_cpa::smallvec::smallvec;
use tessera_cpa::{
    AbstractState, CompositeCpa, ConditionAdjustment, ConfigurableProgramAnalysis, CpaAlgorithm,
    CpaError, EqualityDomain, Exploration, LimitReason, LocationCpa, PartitionKey, Successors,
    TransferRelation, Verdict, prune_flagged,
};
use tessera_test_utils::cfa::{self_loop, straight_line, two_node_error};
use tessera_test_utils::{CounterCpa, TrivialCpa};
use test_log::test;

#[test]
fn test_entry_to_error_is_found_after_one_expansion() {
    let fixture = two_node_error();
    let mut algorithm = CpaAlgorithm::new(TrivialCpa::new(fixture.cfa.clone()), fixture.cfa);
    let mut exploration = algorithm.initial_exploration().unwrap();

    let verdict = algorithm.run(&mut exploration).unwrap();
    assert_eq!(verdict, Verdict::TargetFound);
    assert_eq!(algorithm.statistics().iterations, 1);
    assert_eq!(algorithm.statistics().successors, 1);
    assert_eq!(algorithm.statistics().targets, 1);

    let target = exploration.targets().next().unwrap();
    assert_eq!(
        exploration.reached().state(target).unwrap().location(),
        Some(fixture.error)
    );
    exploration.check_consistency();
}

#[test]
fn test_self_loop_discards_the_fourth_unrolling() {
    let (cfa, _) = self_loop();
    let mut algorithm = CpaAlgorithm::new(CounterCpa::new(cfa.clone(), 3), cfa);
    let mut exploration = algorithm.initial_exploration().unwrap();

    let verdict = algorithm.run(&mut exploration).unwrap();
    assert_eq!(verdict, Verdict::Exhausted);
    assert_eq!(exploration.len(), 4);
    let mut counts: Vec<u32> = exploration.reached().states().map(|s| s.count).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![0, 1, 2, 3]);
    assert_eq!(algorithm.statistics().discarded, 1);
    assert_eq!(exploration.reached().waitlist_len(), 0);
    exploration.check_consistency();
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Named {
    name: &'static str,
    stale: bool,
}

impl AbstractState for Named {
    fn partition_key(&self) -> Option<PartitionKey> {
        Some(PartitionKey::Name(self.name.into()))
    }

    fn must_dump(&self) -> bool {
        self.stale
    }
}

fn named(name: &'static str) -> Named {
    Named { name, stale: false }
}

#[test]
fn test_pruning_a_state_with_two_parents_requeues_both() {
    let mut exploration: Exploration<Named, ()> = Exploration::default();
    let root = exploration.seed(named("root"), ());
    let left = exploration.add_child(root, named("left"), ());
    let right = exploration.add_child(root, named("right"), ());
    let flagged = exploration.add_child(
        left,
        Named {
            name: "flagged",
            stale: true,
        },
        (),
    );
    exploration.link(right, flagged);
    let below = exploration.add_child(flagged, named("below"), ());
    let sibling = exploration.add_child(right, named("sibling"), ());
    let nephew = exploration.add_child(sibling, named("nephew"), ());
    while exploration.reached_mut().pop().is_some() {}

    let summary = prune_flagged(&mut exploration, |state| state.must_dump());

    assert!(!summary.cleared);
    assert_eq!(summary.flagged, vec![flagged]);
    assert_eq!(summary.removed, vec![flagged, below]);
    assert_eq!(summary.requeued, vec![left, right]);
    for kept in [root, left, right, sibling, nephew] {
        assert!(exploration.reached().contains(kept), "{kept} was removed");
    }
    assert!(!exploration.arg().contains(below));
    assert_eq!(
        exploration.arg().children(right).collect::<Vec<_>>(),
        vec![sibling]
    );
    assert_eq!(
        exploration.reached().waitlist().collect::<Vec<_>>(),
        vec![left, right]
    );
    exploration.check_consistency();
}

#[test]
fn test_pruning_the_root_clears_everything() {
    let mut exploration: Exploration<Named, ()> = Exploration::default();
    let root = exploration.seed(
        Named {
            name: "root",
            stale: true,
        },
        (),
    );
    let child = exploration.add_child(root, named("child"), ());
    exploration.add_child(child, named("grandchild"), ());

    let summary = prune_flagged(&mut exploration, |state| state.must_dump());

    assert!(summary.cleared);
    assert_eq!(summary.removed.len(), 3);
    assert_eq!(exploration.len(), 0);
    assert_eq!(exploration.reached().waitlist_len(), 0);
    assert!(exploration.arg().is_empty());
    assert_eq!(exploration.root(), None);
    exploration.check_consistency();
}

#[test]
fn test_yielding_resumes_under_condition_adjustment() {
    let (cfa, _) = self_loop();
    let algorithm = CpaAlgorithm::new(CounterCpa::new(cfa.clone(), 3).with_yield_at(2), cfa);
    let mut driver = ConditionAdjustment::new(algorithm);
    let mut exploration = driver.algorithm().initial_exploration().unwrap();

    let first = driver.algorithm_mut().run(&mut exploration).unwrap();
    assert_eq!(first, Verdict::LimitReached(LimitReason::Yielded));
    assert_eq!(exploration.len(), 3);

    let verdict = driver.run(&mut exploration).unwrap();
    assert_eq!(verdict, Verdict::Exhausted);
    assert_eq!(exploration.len(), 4);
    assert_eq!(driver.rounds(), 0);
}

#[test]
fn test_yields_do_not_use_up_adjustment_rounds() {
    let (cfa, _) = self_loop();
    let algorithm = CpaAlgorithm::new(CounterCpa::new(cfa.clone(), 20).yielding(), cfa);
    let mut driver = ConditionAdjustment::new(algorithm).with_max_rounds(2);
    let mut exploration = driver.algorithm().initial_exploration().unwrap();

    let verdict = driver.run(&mut exploration).unwrap();
    assert_eq!(verdict, Verdict::Exhausted);
    assert_eq!(exploration.len(), 21);
    assert_eq!(driver.rounds(), 0);
    assert!(driver.algorithm().statistics().runs > 20);
    exploration.check_consistency();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Readiness(bool);

impl AbstractState for Readiness {
    fn must_dump(&self) -> bool {
        !self.0
    }
}

/// Flags every state until its single relaxation, including the initial one.
#[derive(Debug, Default)]
struct ColdStart {
    ready: bool,
    domain: EqualityDomain<Readiness>,
}

impl TransferRelation for ColdStart {
    type State = Readiness;
    type Precision = ();

    fn successors(
        &self,
        state: &Readiness,
        _precision: &(),
        _edge: &CfaEdge,
    ) -> Result<Successors<Readiness>, CpaError> {
        Ok(smallvec![*state])
    }
}

impl ConfigurableProgramAnalysis for ColdStart {
    type State = Readiness;
    type Precision = ();
    type Domain = EqualityDomain<Readiness>;
    type Transfer = Self;

    fn name(&self) -> &str {
        "cold-start"
    }

    fn domain(&self) -> &EqualityDomain<Readiness> {
        &self.domain
    }

    fn transfer_relation(&self) -> &Self {
        self
    }

    fn initial_state(&self, _location: Location) -> Result<Readiness, CpaError> {
        Ok(Readiness(self.ready))
    }

    fn initial_precision(&self, _location: Location) -> Result<(), CpaError> {
        Ok(())
    }

    fn adjust_precision(&mut self) -> Result<bool, CpaError> {
        Ok(!std::mem::replace(&mut self.ready, true))
    }
}

#[test]
fn test_flagged_root_is_reseeded_by_the_driver() {
    let (cfa, _) = straight_line(2);
    let cpa = CompositeCpa::new(vec![
        LocationCpa::new(cfa.clone()).into(),
        ColdStart::default().into(),
    ])
    .unwrap();
    let mut driver = ConditionAdjustment::new(CpaAlgorithm::new(cpa, cfa));
    let mut exploration = driver.algorithm().initial_exploration().unwrap();
    let old_root = exploration.root().unwrap();

    let first = driver.algorithm_mut().run(&mut exploration).unwrap();
    assert_eq!(
        first,
        Verdict::LimitReached(LimitReason::PrecisionLimit { dumped: 1 })
    );
    assert_eq!(exploration.len(), 1);

    assert!(driver.adjust(&mut exploration).unwrap());
    assert_eq!(driver.rounds(), 1);
    let new_root = exploration.root().unwrap();
    assert_ne!(new_root, old_root);
    assert!(!exploration.arg().contains(old_root));
    assert_eq!(exploration.len(), 1);
    assert_eq!(exploration.arg().len(), 1);
    assert_eq!(
        exploration.reached().waitlist().collect::<Vec<_>>(),
        vec![new_root]
    );
    assert!(!exploration.reached().state(new_root).unwrap().must_dump());
    exploration.check_consistency();

    assert_eq!(driver.run(&mut exploration).unwrap(), Verdict::Exhausted);
    assert_eq!(exploration.len(), 3);
    assert_eq!(driver.rounds(), 1);
}
