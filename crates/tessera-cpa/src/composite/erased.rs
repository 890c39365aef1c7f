use std::any::TypeId;
use std::sync::Arc;

use tessera_cfa::{CfaEdge, Location};

use crate::{
    AbstractDomain, AbstractState, Action, Adjustment, ConfigurableProgramAnalysis, CpaError,
    Precision, ReachedView, TransferRelation,
};

pub(crate) type ComponentState = Arc<dyn AbstractState>;
pub(crate) type ComponentPrecision = Arc<dyn Precision>;

/// Object-safe face of a [`ConfigurableProgramAnalysis`], used to store
/// analyses with different state types in one composite.
pub(crate) trait ErasedCpa: Send + Sync {
    fn name(&self) -> &str;

    fn state_type(&self) -> TypeId;

    fn precision_type(&self) -> TypeId;

    fn initial_state(&self, location: Location) -> Result<ComponentState, CpaError>;

    fn initial_precision(&self, location: Location) -> Result<ComponentPrecision, CpaError>;

    fn join(&self, a: &dyn AbstractState, b: &dyn AbstractState)
    -> Result<ComponentState, CpaError>;

    fn is_less_or_equal(&self, a: &dyn AbstractState, b: &dyn AbstractState)
    -> Result<bool, CpaError>;

    fn successors(
        &self,
        state: &dyn AbstractState,
        precision: &dyn Precision,
        edge: &CfaEdge,
    ) -> Result<Vec<ComponentState>, CpaError>;

    fn strengthen(
        &self,
        state: &ComponentState,
        siblings: &[&dyn AbstractState],
        edge: &CfaEdge,
        precision: &dyn Precision,
    ) -> Result<Option<ComponentState>, CpaError>;

    /// Returns `old` itself (same allocation) when the merge changed nothing.
    fn merge(
        &self,
        new: &dyn AbstractState,
        old: &ComponentState,
        precision: &dyn Precision,
    ) -> Result<ComponentState, CpaError>;

    fn stop(
        &self,
        state: &dyn AbstractState,
        reached: &dyn AbstractState,
        precision: &dyn Precision,
    ) -> Result<bool, CpaError>;

    fn precision_adjust(
        &self,
        state: &ComponentState,
        precision: &ComponentPrecision,
        reached: &dyn ReachedView,
    ) -> Result<Adjustment<ComponentState, ComponentPrecision>, CpaError>;

    fn adjust_precision(&mut self) -> Result<bool, CpaError>;
}

fn state_of<'a, C: ConfigurableProgramAnalysis>(
    cpa: &C,
    state: &'a dyn AbstractState,
) -> &'a C::State {
    state.downcast_ref::<C::State>().unwrap_or_else(|| {
        panic!(
            "component `{}` was handed a foreign state {state:?}",
            ConfigurableProgramAnalysis::name(cpa)
        )
    })
}

fn precision_of<'a, C: ConfigurableProgramAnalysis>(
    cpa: &C,
    precision: &'a dyn Precision,
) -> &'a C::Precision {
    precision
        .downcast_ref::<C::Precision>()
        .unwrap_or_else(|| {
            panic!(
                "component `{}` was handed a foreign precision {precision:?}",
                ConfigurableProgramAnalysis::name(cpa)
            )
        })
}

/// Keep the existing allocation when a state comes back unchanged.
fn reuse_state<S: AbstractState + Eq>(
    original: &ComponentState,
    typed: &S,
    value: S,
) -> ComponentState {
    if *typed == value {
        Arc::clone(original)
    } else {
        Arc::new(value)
    }
}

impl<C> ErasedCpa for C
where
    C: ConfigurableProgramAnalysis + Send + Sync,
{
    fn name(&self) -> &str {
        ConfigurableProgramAnalysis::name(self)
    }

    fn state_type(&self) -> TypeId {
        TypeId::of::<C::State>()
    }

    fn precision_type(&self) -> TypeId {
        TypeId::of::<C::Precision>()
    }

    fn initial_state(&self, location: Location) -> Result<ComponentState, CpaError> {
        Ok(Arc::new(ConfigurableProgramAnalysis::initial_state(self, location)?))
    }

    fn initial_precision(&self, location: Location) -> Result<ComponentPrecision, CpaError> {
        Ok(Arc::new(ConfigurableProgramAnalysis::initial_precision(
            self, location,
        )?))
    }

    fn join(
        &self,
        a: &dyn AbstractState,
        b: &dyn AbstractState,
    ) -> Result<ComponentState, CpaError> {
        Ok(Arc::new(
            self.domain().join(state_of(self, a), state_of(self, b))?,
        ))
    }

    fn is_less_or_equal(
        &self,
        a: &dyn AbstractState,
        b: &dyn AbstractState,
    ) -> Result<bool, CpaError> {
        self.domain()
            .is_less_or_equal(state_of(self, a), state_of(self, b))
    }

    fn successors(
        &self,
        state: &dyn AbstractState,
        precision: &dyn Precision,
        edge: &CfaEdge,
    ) -> Result<Vec<ComponentState>, CpaError> {
        let successors = self.transfer_relation().successors(
            state_of(self, state),
            precision_of(self, precision),
            edge,
        )?;
        Ok(successors
            .into_iter()
            .map(|s| Arc::new(s) as ComponentState)
            .collect())
    }

    fn strengthen(
        &self,
        state: &ComponentState,
        siblings: &[&dyn AbstractState],
        edge: &CfaEdge,
        precision: &dyn Precision,
    ) -> Result<Option<ComponentState>, CpaError> {
        let typed = state_of(self, state.as_ref());
        let strengthened = self.transfer_relation().strengthen(
            typed,
            siblings,
            edge,
            precision_of(self, precision),
        )?;
        Ok(strengthened.map(|value| reuse_state(state, typed, value)))
    }

    fn merge(
        &self,
        new: &dyn AbstractState,
        old: &ComponentState,
        precision: &dyn Precision,
    ) -> Result<ComponentState, CpaError> {
        let typed_old = state_of(self, old.as_ref());
        let merged = ConfigurableProgramAnalysis::merge(
            self,
            state_of(self, new),
            typed_old,
            precision_of(self, precision),
        )?;
        Ok(reuse_state(old, typed_old, merged))
    }

    fn stop(
        &self,
        state: &dyn AbstractState,
        reached: &dyn AbstractState,
        precision: &dyn Precision,
    ) -> Result<bool, CpaError> {
        ConfigurableProgramAnalysis::stop(
            self,
            state_of(self, state),
            &[state_of(self, reached)],
            precision_of(self, precision),
        )
    }

    fn precision_adjust(
        &self,
        state: &ComponentState,
        precision: &ComponentPrecision,
        reached: &dyn ReachedView,
    ) -> Result<Adjustment<ComponentState, ComponentPrecision>, CpaError> {
        let typed_state = state_of(self, state.as_ref());
        let typed_precision = precision_of(self, precision.as_ref());
        let adjusted = ConfigurableProgramAnalysis::precision_adjust(
            self,
            typed_state,
            typed_precision,
            reached,
        )?;
        if adjusted.action == Action::Discard {
            return Ok(Adjustment::new(
                Arc::clone(state),
                Arc::clone(precision),
                Action::Discard,
            ));
        }
        let new_precision: ComponentPrecision =
            if typed_precision.precision_eq(adjusted.precision.precision_as_any()) {
                Arc::clone(precision)
            } else {
                Arc::new(adjusted.precision)
            };
        Ok(Adjustment::new(
            reuse_state(state, typed_state, adjusted.state),
            new_precision,
            adjusted.action,
        ))
    }

    fn adjust_precision(&mut self) -> Result<bool, CpaError> {
        ConfigurableProgramAnalysis::adjust_precision(self)
    }
}
