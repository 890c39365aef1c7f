use std::fmt::Debug;
use std::marker::PhantomData;

use crate::CpaError;
use crate::lattice::Lattice;

/// Partial order over abstract states.
///
/// `join` must return an upper bound of both arguments. It may
/// over-approximate but must never return a wrong result silently: a failure
/// is reported as an error and aborts the run.
pub trait AbstractDomain {
    type State;

    fn join(&self, a: &Self::State, b: &Self::State) -> Result<Self::State, CpaError>;

    fn is_less_or_equal(&self, a: &Self::State, b: &Self::State) -> Result<bool, CpaError>;
}

/// Domain backed by a [`Lattice`] implementation on the state itself.
#[derive(Debug)]
pub struct LatticeDomain<S>(PhantomData<fn() -> S>);

impl<S> LatticeDomain<S> {
    pub fn new() -> Self {
        LatticeDomain(PhantomData)
    }
}

impl<S> Default for LatticeDomain<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Lattice> AbstractDomain for LatticeDomain<S> {
    type State = S;

    fn join(&self, a: &S, b: &S) -> Result<S, CpaError> {
        Ok(a.join(b))
    }

    fn is_less_or_equal(&self, a: &S, b: &S) -> Result<bool, CpaError> {
        Ok(a.is_subseteq(b))
    }
}

/// Flat domain: a state is only below itself.
///
/// Joining two distinct states is a [`CpaError::Domain`]; analyses using it
/// pair it with [`MergePolicy::Sep`](crate::MergePolicy::Sep).
#[derive(Debug)]
pub struct EqualityDomain<S>(PhantomData<fn() -> S>);

impl<S> EqualityDomain<S> {
    pub fn new() -> Self {
        EqualityDomain(PhantomData)
    }
}

impl<S> Default for EqualityDomain<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Eq + Debug> AbstractDomain for EqualityDomain<S> {
    type State = S;

    fn join(&self, a: &S, b: &S) -> Result<S, CpaError> {
        if a == b {
            Ok(a.clone())
        } else {
            Err(CpaError::domain(
                "equality",
                format!("no upper bound for {a:?} and {b:?}"),
            ))
        }
    }

    fn is_less_or_equal(&self, a: &S, b: &S) -> Result<bool, CpaError> {
        Ok(a == b)
    }
}
