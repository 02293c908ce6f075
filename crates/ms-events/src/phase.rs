use std::fmt;

use crate::{EventError, EventResult};

// ── Phase ─────────────────────────────────────────────────────────────────────

/// A lifecycle phase a component may listen to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum Phase {
    PostSetup,
    TimeStepPrepare,
    TimeStep,
    TimeStepCleanup,
    CollectMetrics,
    SimulationEnd,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::PostSetup,
        Phase::TimeStepPrepare,
        Phase::TimeStep,
        Phase::TimeStepCleanup,
        Phase::CollectMetrics,
        Phase::SimulationEnd,
    ];

    /// The phases emitted once per step, in emission order.
    pub const STEP_SEQUENCE: [Phase; 4] = [
        Phase::TimeStepPrepare,
        Phase::TimeStep,
        Phase::TimeStepCleanup,
        Phase::CollectMetrics,
    ];

    /// Position in [`Phase::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::PostSetup => "post_setup",
            Phase::TimeStepPrepare => "time_step__prepare",
            Phase::TimeStep => "time_step",
            Phase::TimeStepCleanup => "time_step__cleanup",
            Phase::CollectMetrics => "collect_metrics",
            Phase::SimulationEnd => "simulation_end",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Priority ──────────────────────────────────────────────────────────────────

/// Listener priority, 0 (earliest) to 9 (latest).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Priority(pub(crate) u8);

impl Priority {
    pub const FIRST: Priority = Priority(0);
    pub const DEFAULT: Priority = Priority(5);
    pub const LAST: Priority = Priority(9);

    /// Number of distinct priority levels.
    pub const LEVELS: usize = 10;

    pub fn new(value: u8) -> EventResult<Self> {
        if value as usize >= Self::LEVELS {
            return Err(EventError::InvalidPriority(value));
        }
        Ok(Priority(value))
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::DEFAULT
    }
}

impl TryFrom<u8> for Priority {
    type Error = EventError;
    fn try_from(value: u8) -> EventResult<Self> {
        Priority::new(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
