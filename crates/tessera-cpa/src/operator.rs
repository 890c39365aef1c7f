use crate::{AbstractDomain, CpaError};

/// How a new state is combined with a reached state at the same partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MergePolicy {
    /// Never merge: the reached state is returned unchanged.
    #[default]
    Sep,
    /// Replace the reached state with `join(new, old)`.
    Join,
}

impl MergePolicy {
    pub fn apply<D>(self, domain: &D, new: &D::State, old: &D::State) -> Result<D::State, CpaError>
    where
        D: AbstractDomain,
        D::State: Clone,
    {
        match self {
            MergePolicy::Sep => Ok(old.clone()),
            MergePolicy::Join => domain.join(new, old),
        }
    }
}

/// When a new state counts as already covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopPolicy {
    /// Covered iff some single reached state subsumes it.
    #[default]
    Sep,
    /// Never covered; only sound for analyses that terminate by other means.
    Never,
}

impl StopPolicy {
    pub fn apply<D: AbstractDomain>(
        self,
        domain: &D,
        state: &D::State,
        reached: &[&D::State],
    ) -> Result<bool, CpaError> {
        match self {
            StopPolicy::Sep => Ok(covering_index(domain, state, reached)?.is_some()),
            StopPolicy::Never => Ok(false),
        }
    }
}

/// Position of the first state in `reached` that subsumes `state`.
pub fn covering_index<D: AbstractDomain>(
    domain: &D,
    state: &D::State,
    reached: &[&D::State],
) -> Result<Option<usize>, CpaError> {
    for (index, other) in reached.iter().enumerate() {
        if domain.is_less_or_equal(state, other)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EqualityDomain, LatticeDomain, Lattice};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Max(u8);

    impl Lattice for Max {
        fn join(&self, other: &Self) -> Self {
            Max(self.0.max(other.0))
        }

        fn meet(&self, other: &Self) -> Self {
            Max(self.0.min(other.0))
        }

        fn is_subseteq(&self, other: &Self) -> bool {
            self.0 <= other.0
        }
    }

    #[test]
    fn test_merge_policies() {
        let domain = LatticeDomain::<Max>::new();
        assert_eq!(
            MergePolicy::Sep.apply(&domain, &Max(5), &Max(2)).unwrap(),
            Max(2)
        );
        assert_eq!(
            MergePolicy::Join.apply(&domain, &Max(5), &Max(2)).unwrap(),
            Max(5)
        );
    }

    #[test]
    fn test_stop_policies() {
        let domain = LatticeDomain::<Max>::new();
        let reached = [&Max(1), &Max(4)];
        assert!(StopPolicy::Sep.apply(&domain, &Max(3), &reached).unwrap());
        assert!(!StopPolicy::Sep.apply(&domain, &Max(7), &reached).unwrap());
        assert!(!StopPolicy::Never.apply(&domain, &Max(0), &reached).unwrap());
        assert!(!StopPolicy::Sep.apply(&domain, &Max(0), &[]).unwrap());
        assert_eq!(covering_index(&domain, &Max(3), &reached).unwrap(), Some(1));
    }

    #[test]
    fn test_flat_stop_needs_equal_state() {
        let domain = EqualityDomain::<&str>::new();
        assert!(StopPolicy::Sep.apply(&domain, &"a", &[&"b", &"a"]).unwrap());
        assert!(!StopPolicy::Sep.apply(&domain, &"c", &[&"b", &"a"]).unwrap());
    }
}
