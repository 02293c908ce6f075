//! Per-phase listener registry and ordered dispatch.
//!
//! # Design
//!
//! Each phase owns ten buckets, one per priority level.  Registering a
//! listener appends it to its bucket, so iterating buckets in order and each
//! bucket front to back yields ascending priority with ties in registration
//! order.  No sort is ever needed.
//!
//! The manager is generic over the listener handle `L`.  The component
//! manager stores plain slot indices here and resolves them back to
//! components when an event is emitted, which keeps this crate free of any
//! component types.

use tracing::debug;

use crate::{Event, Phase, Priority};

struct Channel<L> {
    buckets: [Vec<L>; Priority::LEVELS],
}

impl<L> Default for Channel<L> {
    fn default() -> Self {
        Self { buckets: std::array::from_fn(|_| Vec::new()) }
    }
}

/// Prioritized listeners for every [`Phase`].
pub struct EventManager<L> {
    channels: [Channel<L>; 6],
}

impl<L> Default for EventManager<L> {
    fn default() -> Self {
        Self { channels: std::array::from_fn(|_| Channel::default()) }
    }
}

impl<L: Copy> EventManager<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `listener` to `phase` at `priority`.
    pub fn register_listener(&mut self, phase: Phase, listener: L, priority: Priority) {
        self.channels[phase.index()].buckets[priority.value() as usize].push(listener);
    }

    /// Listeners of `phase` in dispatch order.
    pub fn listeners(&self, phase: Phase) -> Vec<L> {
        self.channels[phase.index()]
            .buckets
            .iter()
            .flat_map(|b| b.iter().copied())
            .collect()
    }

    /// Listeners of `phase` paired with their priority, in dispatch order.
    pub fn listeners_with_priority(&self, phase: Phase) -> Vec<(Priority, L)> {
        self.channels[phase.index()]
            .buckets
            .iter()
            .enumerate()
            .flat_map(|(p, b)| b.iter().map(move |&l| (Priority(p as u8), l)))
            .collect()
    }

    pub fn listener_count(&self, phase: Phase) -> usize {
        self.channels[phase.index()].buckets.iter().map(Vec::len).sum()
    }

    /// Call `dispatch` for every listener of `phase`, in order.
    ///
    /// The first error stops the phase; later listeners are not called and
    /// the error is returned unchanged.
    pub fn emit<E>(
        &self,
        phase:    Phase,
        event:    &Event,
        mut dispatch: impl FnMut(L, &Event) -> Result<(), E>,
    ) -> Result<(), E> {
        debug!(
            phase = phase.as_str(),
            tick = event.tick.0,
            simulants = event.index.len(),
            listeners = self.listener_count(phase),
            "emitting phase"
        );
        for bucket in &self.channels[phase.index()].buckets {
            for &listener in bucket {
                dispatch(listener, event)?;
            }
        }
        Ok(())
    }
}
