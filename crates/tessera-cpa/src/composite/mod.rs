//! Product of several analyses.
//!
//! A [`CompositeCpa`] runs an ordered list of [`Component`]s in lockstep. Its
//! states and precisions are tuples holding one entry per component, in the
//! order the components were given; every operator is evaluated pointwise.

mod erased;
mod state;

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use tessera_cfa::{CfaEdge, Location};
use tracing::{debug, trace};

use crate::adjustment::{PruneSummary, prune_flagged};
use crate::{
    AbstractDomain, AbstractState, Action, Adjustment, ConfigurableProgramAnalysis, CpaError,
    Exploration, ReachedView, Successors, TransferRelation,
};

use erased::{ComponentPrecision, ComponentState, ErasedCpa};
pub use state::{CompositePrecision, CompositeState};

/// One analysis taking part in a [`CompositeCpa`].
pub struct Component {
    cpa: Box<dyn ErasedCpa>,
}

impl Component {
    pub fn new<C>(cpa: C) -> Self
    where
        C: ConfigurableProgramAnalysis + Send + Sync + 'static,
    {
        Component { cpa: Box::new(cpa) }
    }

    pub fn name(&self) -> &str {
        self.cpa.name()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name()).finish()
    }
}

impl<C> From<C> for Component
where
    C: ConfigurableProgramAnalysis + Send + Sync + 'static,
{
    fn from(cpa: C) -> Self {
        Component::new(cpa)
    }
}

/// Analysis whose domain, transfer relation and operators are the pointwise
/// product of its components.
#[derive(Debug)]
pub struct CompositeCpa {
    components: Vec<Component>,
    /// Which components relaxed their precision in the last adjustment.
    changed: Vec<bool>,
}

impl CompositeCpa {
    pub fn new(components: Vec<Component>) -> Result<Self, CpaError> {
        if components.is_empty() {
            return Err(CpaError::configuration(
                "a composite analysis needs at least one component",
            ));
        }
        debug!(
            components = ?components.iter().map(Component::name).collect::<Vec<_>>(),
            "built composite analysis"
        );
        let changed = vec![false; components.len()];
        Ok(CompositeCpa {
            components,
            changed,
        })
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(Component::name)
    }

    /// Assemble a tuple from externally built component states, checking
    /// arity and that each position holds its component's state type.
    pub fn compose_state(
        &self,
        components: Vec<Arc<dyn AbstractState>>,
    ) -> Result<CompositeState, CpaError> {
        self.check_arity(components.len())?;
        for (component, state) in self.components.iter().zip(&components) {
            if state.as_ref().as_any().type_id() != component.cpa.state_type() {
                return Err(CpaError::configuration(format!(
                    "component `{}` cannot hold state {state:?}",
                    component.name()
                )));
            }
        }
        Ok(CompositeState::from_components(components))
    }

    /// Precision counterpart of [`compose_state`](Self::compose_state).
    pub fn compose_precision(
        &self,
        components: Vec<Arc<dyn crate::Precision>>,
    ) -> Result<CompositePrecision, CpaError> {
        self.check_arity(components.len())?;
        for (component, precision) in self.components.iter().zip(&components) {
            if precision.as_ref().precision_as_any().type_id() != component.cpa.precision_type() {
                return Err(CpaError::configuration(format!(
                    "component `{}` cannot hold precision {precision:?}",
                    component.name()
                )));
            }
        }
        Ok(CompositePrecision::from_components(components))
    }

    fn check_arity(&self, got: usize) -> Result<(), CpaError> {
        if got == self.components.len() {
            Ok(())
        } else {
            Err(CpaError::ArityMismatch {
                expected: self.components.len(),
                got,
            })
        }
    }

    fn positions(&self) -> impl Iterator<Item = (usize, &dyn ErasedCpa)> {
        self.components
            .iter()
            .enumerate()
            .map(|(i, component)| (i, component.cpa.as_ref()))
    }
}

impl AbstractDomain for CompositeCpa {
    type State = CompositeState;

    fn join(&self, a: &CompositeState, b: &CompositeState) -> Result<CompositeState, CpaError> {
        self.check_arity(a.len())?;
        self.check_arity(b.len())?;
        let joined = self
            .positions()
            .map(|(i, cpa)| cpa.join(a.component_arc(i).as_ref(), b.component_arc(i).as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompositeState::from_components(joined))
    }

    fn is_less_or_equal(&self, a: &CompositeState, b: &CompositeState) -> Result<bool, CpaError> {
        self.check_arity(a.len())?;
        self.check_arity(b.len())?;
        for (i, cpa) in self.positions() {
            if !cpa.is_less_or_equal(a.component_arc(i).as_ref(), b.component_arc(i).as_ref())? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl TransferRelation for CompositeCpa {
    type State = CompositeState;
    type Precision = CompositePrecision;

    fn successors(
        &self,
        state: &CompositeState,
        precision: &CompositePrecision,
        edge: &CfaEdge,
    ) -> Result<Successors<CompositeState>, CpaError> {
        self.check_arity(state.len())?;
        self.check_arity(precision.len())?;

        let mut tuples: Vec<Vec<ComponentState>> = vec![Vec::with_capacity(self.len())];
        for (i, cpa) in self.positions() {
            let options = cpa.successors(
                state.component_arc(i).as_ref(),
                precision.component_arc(i).as_ref(),
                edge,
            )?;
            if options.is_empty() {
                trace!(component = cpa.name(), %edge, "edge infeasible");
                return Ok(Successors::new());
            }
            tuples = tuples
                .into_iter()
                .flat_map(|prefix| {
                    options.iter().map(move |option| {
                        let mut tuple = prefix.clone();
                        tuple.push(Arc::clone(option));
                        tuple
                    })
                })
                .collect();
        }

        let mut successors = Successors::new();
        'tuples: for tuple in tuples {
            let siblings: SmallVec<[&dyn AbstractState; 4]> =
                tuple.iter().map(|state| state.as_ref()).collect();
            let mut strengthened = Vec::with_capacity(tuple.len());
            for (i, cpa) in self.positions() {
                match cpa.strengthen(
                    &tuple[i],
                    &siblings,
                    edge,
                    precision.component_arc(i).as_ref(),
                )? {
                    Some(state) => strengthened.push(state),
                    None => {
                        trace!(component = cpa.name(), %edge, "successor rejected by strengthening");
                        continue 'tuples;
                    }
                }
            }
            successors.push(CompositeState::from_components(strengthened));
        }
        Ok(successors)
    }
}

impl ConfigurableProgramAnalysis for CompositeCpa {
    type State = CompositeState;
    type Precision = CompositePrecision;
    type Domain = Self;
    type Transfer = Self;

    fn name(&self) -> &str {
        "composite"
    }

    fn domain(&self) -> &Self {
        self
    }

    fn transfer_relation(&self) -> &Self {
        self
    }

    fn initial_state(&self, location: Location) -> Result<CompositeState, CpaError> {
        let states = self
            .positions()
            .map(|(_, cpa)| cpa.initial_state(location))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompositeState::from_components(states))
    }

    fn initial_precision(&self, location: Location) -> Result<CompositePrecision, CpaError> {
        let precisions = self
            .positions()
            .map(|(_, cpa)| cpa.initial_precision(location))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompositePrecision::from_components(precisions))
    }

    /// Each component merges its own position; `old` is returned as is when
    /// none of them changed anything.
    fn merge(
        &self,
        new: &CompositeState,
        old: &CompositeState,
        precision: &CompositePrecision,
    ) -> Result<CompositeState, CpaError> {
        self.check_arity(new.len())?;
        self.check_arity(old.len())?;
        let mut changed = false;
        let mut merged = Vec::with_capacity(self.len());
        for (i, cpa) in self.positions() {
            let previous = old.component_arc(i);
            let state = cpa.merge(
                new.component_arc(i).as_ref(),
                previous,
                precision.component_arc(i).as_ref(),
            )?;
            changed |= !Arc::ptr_eq(&state, previous);
            merged.push(state);
        }
        if changed {
            Ok(CompositeState::from_components(merged))
        } else {
            Ok(old.clone())
        }
    }

    /// Covered when a single reached tuple covers `state` in every component.
    fn stop(
        &self,
        state: &CompositeState,
        reached: &[&CompositeState],
        precision: &CompositePrecision,
    ) -> Result<bool, CpaError> {
        self.check_arity(state.len())?;
        'candidates: for candidate in reached {
            self.check_arity(candidate.len())?;
            for (i, cpa) in self.positions() {
                let covered = cpa.stop(
                    state.component_arc(i).as_ref(),
                    candidate.component_arc(i).as_ref(),
                    precision.component_arc(i).as_ref(),
                )?;
                if !covered {
                    continue 'candidates;
                }
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn precision_adjust(
        &self,
        state: &CompositeState,
        precision: &CompositePrecision,
        reached: &dyn ReachedView,
    ) -> Result<Adjustment<CompositeState, CompositePrecision>, CpaError> {
        self.check_arity(state.len())?;
        self.check_arity(precision.len())?;
        let mut action = Action::Continue;
        let mut states: Vec<ComponentState> = Vec::with_capacity(self.len());
        let mut precisions: Vec<ComponentPrecision> = Vec::with_capacity(self.len());
        for (i, cpa) in self.positions() {
            let adjusted = cpa.precision_adjust(
                state.component_arc(i),
                precision.component_arc(i),
                reached,
            )?;
            action = action.combine(adjusted.action);
            if action == Action::Discard {
                return Ok(Adjustment::new(
                    state.clone(),
                    precision.clone(),
                    Action::Discard,
                ));
            }
            states.push(adjusted.state);
            precisions.push(adjusted.precision);
        }
        Ok(Adjustment::new(
            CompositeState::from_components(states),
            CompositePrecision::from_components(precisions),
            action,
        ))
    }

    /// Ask every component to relax, remembering which ones did.
    fn adjust_precision(&mut self) -> Result<bool, CpaError> {
        for (component, changed) in self.components.iter_mut().zip(self.changed.iter_mut()) {
            *changed = component.cpa.adjust_precision()?;
            if *changed {
                debug!(component = component.cpa.name(), "precision relaxed");
            }
        }
        Ok(self.changed.iter().any(|&changed| changed))
    }

    /// Prune states whose must-dump flag is raised by a component that
    /// relaxed in the last adjustment.
    fn adjust_reached_set(
        &self,
        exploration: &mut Exploration<CompositeState, CompositePrecision>,
    ) -> Result<PruneSummary, CpaError> {
        let relaxed = &self.changed;
        Ok(prune_flagged(exploration, |state: &CompositeState| {
            state
                .iter()
                .zip(relaxed)
                .any(|(component, &relaxed)| relaxed && component.must_dump())
        }))
    }
}
