use ms_component::ComponentError;
use ms_core::{CoreError, SimulantId};
use ms_population::PopulationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state machine configuration error: {0}")]
    Configuration(String),

    #[error("state {0:?} is declared more than once")]
    DuplicateState(String),

    #[error("state {state:?} has a transition to undeclared state {target:?}")]
    UnknownTarget { state: String, target: String },

    /// A simulant's state column holds a value no declared state matches.
    #[error("{simulant} has {column} = {value:?}, which is not a declared state")]
    UnknownState {
        column:   String,
        simulant: SimulantId,
        value:    String,
    },

    /// Transition probabilities out of `state` sum past one for `simulant`
    /// while the null transition is allowed.
    #[error("transition probabilities out of {state:?} sum to {total} for {simulant}")]
    ProbabilityConservation {
        state:    String,
        simulant: SimulantId,
        total:    f64,
    },

    /// Every transition out of `state` has probability zero for `simulant`
    /// and there is no null transition to fall back on.
    #[error("no transition out of {state:?} is possible for {simulant}")]
    NoOutcome { state: String, simulant: SimulantId },

    /// The side effect of `state` added, removed or reordered rows of the
    /// cohort entering it.
    #[error("side effect of {state:?} changed the cohort rows ({expected} in, {got} out)")]
    CohortRowsChanged {
        state:    String,
        expected: usize,
        got:      usize,
    },

    #[error("transition {state:?} -> {target:?} gave probability {value} for {simulant}")]
    InvalidProbability {
        state:    String,
        target:   String,
        simulant: SimulantId,
        value:    f64,
    },

    /// A value pipeline failed.
    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Population(#[from] PopulationError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type StateResult<T> = Result<T, StateError>;

impl From<StateError> for ComponentError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::Component(e) => e,
            StateError::Population(e) => ComponentError::Population(e),
            StateError::Core(e) => ComponentError::Core(e),
            e @ (StateError::Configuration(_)
            | StateError::DuplicateState(_)
            | StateError::UnknownTarget { .. }
            | StateError::UnknownState { .. }
            | StateError::CohortRowsChanged { .. }) => ComponentError::Configuration(e.to_string()),
            other => ComponentError::model(other),
        }
    }
}
