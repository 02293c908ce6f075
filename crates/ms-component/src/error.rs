use ms_core::CoreError;
use ms_lookup::LookupError;
use ms_population::PopulationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComponentError {
    /// Invalid declarations or configuration detected at setup or run time.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("a component named {0:?} has already been added")]
    DuplicateName(String),

    /// A hook tried to reach the population without a view.
    #[error("component {0:?} has no population view; declare created or required columns")]
    NoPopulationView(String),

    #[error("component {component:?} has no lookup table {table:?}")]
    UnknownLookup { component: String, table: String },

    #[error("no value pipeline named {0:?}")]
    UnknownValue(String),

    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    #[error(transparent)]
    Population(#[from] PopulationError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// Errors raised by model code inside a hook.
    #[error("model error: {0}")]
    Model(Box<dyn std::error::Error + Send + Sync>),
}

impl ComponentError {
    pub fn model(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        ComponentError::Model(Box::new(err))
    }
}

/// Shorthand result type for `ms-component`.
pub type ComponentResult<T> = Result<T, ComponentError>;

/// A hook failure, tagged with where it happened.
#[derive(Debug, Error)]
#[error("component {component:?} failed during {phase}: {source}")]
pub struct HookFailure {
    pub phase:     &'static str,
    pub component: String,
    #[source]
    pub source:    ComponentError,
}
