use ms_core::{SimulantId, Tick, SECS_PER_YEAR};

/// What a listener receives: the simulants the phase concerns and the
/// current time.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Simulants affected by this phase.
    pub index: Vec<SimulantId>,
    /// The step being processed.
    pub tick: Tick,
    /// Simulated seconds the step covers.
    pub step_size_secs: u32,
}

impl Event {
    pub fn new(index: Vec<SimulantId>, tick: Tick, step_size_secs: u32) -> Self {
        Self { index, tick, step_size_secs }
    }

    /// Step size in (fractional) years, for converting annual rates.
    #[inline]
    pub fn step_size_years(&self) -> f64 {
        self.step_size_secs as f64 / SECS_PER_YEAR
    }

    /// The same event narrowed to a different set of simulants.
    pub fn split(&self, index: Vec<SimulantId>) -> Event {
        Event { index, ..self.clone() }
    }
}
