use ms_component::{ComponentError, HookFailure};
use ms_core::CoreError;
use ms_population::PopulationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    /// An operation was called in the wrong lifecycle state, e.g. `step`
    /// after `finalize`.
    #[error("simulation lifecycle error: {0}")]
    Lifecycle(String),

    /// A component hook failed; the rest of the phase was skipped.
    #[error("{phase} failed in component {component:?}: {source}")]
    Phase {
        phase:     &'static str,
        component: String,
        #[source]
        source:    ComponentError,
    },

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Population(#[from] PopulationError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;

impl From<HookFailure> for SimError {
    fn from(f: HookFailure) -> Self {
        SimError::Phase { phase: f.phase, component: f.component, source: f.source }
    }
}
