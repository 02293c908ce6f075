use std::fmt;
use std::sync::Arc;

use ms_population::Frame;

use crate::{StateResult, StepContext, Transition, TransitionSet};

/// Runs on the sub-cohort entering a state, after the state column is set.
pub type SideEffectFn = dyn Fn(&mut Frame, &StepContext<'_>) -> StateResult<()> + Send + Sync;

/// A named category simulants occupy, with its outgoing transitions.
///
/// New states allow the null transition; see
/// [`without_null_transition`](Self::without_null_transition).
#[derive(Clone)]
pub struct State {
    id:          String,
    transitions: TransitionSet,
    side_effect: Option<Arc<SideEffectFn>>,
}

impl State {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id:          id.into(),
            transitions: TransitionSet::new(true),
            side_effect: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.add_transition(transition);
        self
    }

    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// Treat outgoing probabilities as weights that always move the simulant.
    pub fn without_null_transition(mut self) -> Self {
        self.transitions.set_allow_null_transition(false);
        self
    }

    pub fn with_side_effect(
        mut self,
        f: impl Fn(&mut Frame, &StepContext<'_>) -> StateResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.side_effect = Some(Arc::new(f));
        self
    }

    pub fn transition_set(&self) -> &TransitionSet {
        &self.transitions
    }

    pub(crate) fn side_effect(&self) -> Option<&SideEffectFn> {
        self.side_effect.as_deref()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("transitions", &self.transitions)
            .field("side_effect", &self.side_effect.is_some())
            .finish()
    }
}
