//! Assertion helpers for the operator contracts every analysis must honour.
//!
//! Each helper checks its laws over a set of sample states and collects every
//! violation into one report, so a failing analysis shows all broken laws at
//! once.
//!
//! # Example
//!
//! ```
//! use tessera_cpa::LatticeDomain;
//! use tessera_test_utils::Parity;
//! use tessera_test_utils::laws::assert_domain_laws;
//!
//! let samples = [Parity::Bottom, Parity::Even, Parity::Odd, Parity::Top];
//! assert_domain_laws(&LatticeDomain::<Parity>::new(), &samples);
//! ```

use std::fmt::{Debug, Write};

use tessera_cpa::{AbstractDomain, ConfigurableProgramAnalysis, HasBottom, HasTop, partition_of};

fn report(kind: &str, violations: Vec<String>) {
    if violations.is_empty() {
        return;
    }
    let mut msg = format!("{} {kind} law violation(s):\n", violations.len());
    for (i, v) in violations.iter().enumerate() {
        let _ = writeln!(msg, "  {}. {}", i + 1, v);
    }
    panic!("{msg}");
}

/// Check that `join` bounds both arguments and that `is_less_or_equal` is
/// reflexive, over every pair of `samples`.
pub fn assert_domain_laws<D>(domain: &D, samples: &[D::State])
where
    D: AbstractDomain,
    D::State: Debug,
{
    let mut violations = Vec::new();
    check_domain_laws(domain, samples, &mut violations);
    report("domain", violations);
}

/// Check that `merge` returns either `old` or something above it, for every
/// `(new, old)` pair of `samples` sharing a partition.
pub fn assert_merge_laws<C>(cpa: &C, samples: &[C::State], precision: &C::Precision)
where
    C: ConfigurableProgramAnalysis,
{
    let mut violations = Vec::new();
    check_merge_laws(cpa, samples, precision, &mut violations);
    report("merge", violations);
}

/// Check that `stop` accepts a state against itself and against anything
/// above it, never against an empty reached set, and only when some state of
/// the same partition subsumes it.
pub fn assert_stop_laws<C>(cpa: &C, samples: &[C::State], precision: &C::Precision)
where
    C: ConfigurableProgramAnalysis,
{
    let mut violations = Vec::new();
    check_stop_laws(cpa, samples, precision, &mut violations);
    report("stop", violations);
}

/// Every contract at once: domain, merge and stop.
pub fn assert_cpa_laws<C>(cpa: &C, samples: &[C::State], precision: &C::Precision)
where
    C: ConfigurableProgramAnalysis,
{
    let mut violations = Vec::new();
    check_domain_laws(cpa.domain(), samples, &mut violations);
    check_merge_laws(cpa, samples, precision, &mut violations);
    check_stop_laws(cpa, samples, precision, &mut violations);
    report("analysis", violations);
}

/// Lattice laws for state types backing a
/// [`LatticeDomain`](tessera_cpa::LatticeDomain): commutative idempotent join
/// and meet, ordering consistent with join, and bottom/top bounds.
pub fn assert_finite_lattice_laws<L>(elements: &[L])
where
    L: HasBottom + HasTop + PartialEq + Debug,
{
    let mut v = Vec::new();
    let (bottom, top) = (L::bottom(), L::top());
    for a in elements {
        if a.join(a) != *a {
            v.push(format!("join not idempotent on {a:?}"));
        }
        if a.meet(a) != *a {
            v.push(format!("meet not idempotent on {a:?}"));
        }
        if !bottom.is_subseteq(a) {
            v.push(format!("bottom is not below {a:?}"));
        }
        if !a.is_subseteq(&top) {
            v.push(format!("{a:?} is not below top"));
        }
        for b in elements {
            if a.join(b) != b.join(a) {
                v.push(format!("join not commutative on {a:?}, {b:?}"));
            }
            if a.meet(b) != b.meet(a) {
                v.push(format!("meet not commutative on {a:?}, {b:?}"));
            }
            let sub = a.is_subseteq(b);
            if sub != (a.join(b) == *b) {
                v.push(format!(
                    "{a:?}.is_subseteq({b:?}) = {sub} disagrees with join"
                ));
            }
        }
    }
    report("lattice", v);
}

fn check_domain_laws<D>(domain: &D, samples: &[D::State], v: &mut Vec<String>)
where
    D: AbstractDomain,
    D::State: Debug,
{
    for a in samples {
        match domain.is_less_or_equal(a, a) {
            Ok(true) => {}
            Ok(false) => v.push(format!("is_less_or_equal not reflexive on {a:?}")),
            Err(error) => v.push(format!("is_less_or_equal({a:?}, {a:?}) failed: {error}")),
        }
        for b in samples {
            let joined = match domain.join(a, b) {
                Ok(joined) => joined,
                // a domain may refuse a join, but never silently
                Err(_) => continue,
            };
            for (side, operand) in [("left", a), ("right", b)] {
                if !matches!(domain.is_less_or_equal(operand, &joined), Ok(true)) {
                    v.push(format!(
                        "join({a:?}, {b:?}) = {joined:?} is not above its {side} operand"
                    ));
                }
            }
        }
    }
}

fn check_merge_laws<C>(cpa: &C, samples: &[C::State], precision: &C::Precision, v: &mut Vec<String>)
where
    C: ConfigurableProgramAnalysis,
{
    for new in samples {
        for old in samples {
            if partition_of(new) != partition_of(old) {
                continue;
            }
            match cpa.merge(new, old, precision) {
                Ok(merged) if merged == *old => {}
                Ok(merged) => {
                    if !matches!(cpa.domain().is_less_or_equal(old, &merged), Ok(true)) {
                        v.push(format!(
                            "merge({new:?}, {old:?}) = {merged:?} is neither old nor above it"
                        ));
                    }
                }
                Err(error) => v.push(format!("merge({new:?}, {old:?}) failed: {error}")),
            }
        }
    }
}

fn check_stop_laws<C>(cpa: &C, samples: &[C::State], precision: &C::Precision, v: &mut Vec<String>)
where
    C: ConfigurableProgramAnalysis,
{
    for state in samples {
        if !matches!(cpa.stop(state, &[], precision), Ok(false)) {
            v.push(format!("stop({state:?}, []) did not answer false"));
        }
        if !matches!(cpa.stop(state, &[state], precision), Ok(true)) {
            v.push(format!("stop({state:?}, [{state:?}]) did not answer true"));
        }
        let key = partition_of(state);
        let mut same_partition = Vec::new();
        for other in samples {
            let below = matches!(cpa.domain().is_less_or_equal(state, other), Ok(true));
            let stopped = matches!(cpa.stop(state, &[other], precision), Ok(true));
            if below && !stopped {
                v.push(format!(
                    "{state:?} is below {other:?} but stop does not cover it"
                ));
            }
            if partition_of(other) != key {
                continue;
            }
            if stopped && !below {
                v.push(format!(
                    "stop covers {state:?} by {other:?}, which is not above it"
                ));
            }
            same_partition.push(other);
        }
        let stopped = matches!(cpa.stop(state, &same_partition, precision), Ok(true));
        let subsumed = same_partition
            .iter()
            .any(|other| matches!(cpa.domain().is_less_or_equal(state, other), Ok(true)));
        if stopped && !subsumed {
            v.push(format!(
                "stop covers {state:?} although no state of its partition is above it"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use tessera_cfa::{CfaEdge, Location};
    use tessera_cpa::{CpaError, EqualityDomain, LatticeDomain, Successors, TransferRelation};

    use super::*;
    use crate::{Parity, ParityCpa};

    #[test]
    fn test_parity_satisfies_lattice_and_domain_laws() {
        let samples = [Parity::Bottom, Parity::Even, Parity::Odd, Parity::Top];
        assert_finite_lattice_laws(&samples);
        assert_domain_laws(&LatticeDomain::<Parity>::new(), &samples);
    }

    #[test]
    fn test_equality_domain_refusing_joins_is_lawful() {
        assert_domain_laws(&EqualityDomain::<u8>::new(), &[1, 2, 3]);
    }

    #[derive(Debug)]
    struct Broken;

    impl AbstractDomain for Broken {
        type State = u8;

        fn join(&self, a: &u8, b: &u8) -> Result<u8, tessera_cpa::CpaError> {
            Ok(*a.min(b))
        }

        fn is_less_or_equal(&self, a: &u8, b: &u8) -> Result<bool, tessera_cpa::CpaError> {
            Ok(a <= b)
        }
    }

    #[test]
    #[should_panic(expected = "domain law violation")]
    fn test_detects_join_below_operand() {
        assert_domain_laws(&Broken, &[1, 2]);
    }

    /// Parity analysis whose stop covers anything once the partition is
    /// non-empty.
    #[derive(Debug, Default)]
    struct Greedy(ParityCpa);

    impl TransferRelation for Greedy {
        type State = Parity;
        type Precision = ();

        fn successors(
            &self,
            state: &Parity,
            precision: &(),
            edge: &CfaEdge,
        ) -> Result<Successors<Parity>, CpaError> {
            TransferRelation::successors(&self.0, state, precision, edge)
        }
    }

    impl ConfigurableProgramAnalysis for Greedy {
        type State = Parity;
        type Precision = ();
        type Domain = LatticeDomain<Parity>;
        type Transfer = Self;

        fn name(&self) -> &str {
            "greedy"
        }

        fn domain(&self) -> &LatticeDomain<Parity> {
            self.0.domain()
        }

        fn transfer_relation(&self) -> &Self {
            self
        }

        fn initial_state(&self, location: Location) -> Result<Parity, CpaError> {
            self.0.initial_state(location)
        }

        fn initial_precision(&self, location: Location) -> Result<(), CpaError> {
            self.0.initial_precision(location)
        }

        fn stop(
            &self,
            _state: &Parity,
            reached: &[&Parity],
            _precision: &(),
        ) -> Result<bool, CpaError> {
            Ok(!reached.is_empty())
        }
    }

    #[test]
    fn test_parity_analysis_satisfies_stop_laws() {
        let samples = [Parity::Bottom, Parity::Even, Parity::Odd, Parity::Top];
        assert_stop_laws(&ParityCpa::default(), &samples, &());
    }

    #[test]
    #[should_panic(expected = "stop law violation")]
    fn test_detects_stop_covering_without_subsumption() {
        assert_stop_laws(&Greedy::default(), &[Parity::Even, Parity::Odd], &());
    }
}
