//! Strongly typed simulant identifier.
//!
//! `SimulantId` is `Copy + Ord + Hash` so it can be used as a map key and as
//! a sorted collection element without ceremony.  The inner integer is `pub`
//! to allow direct indexing into column `Vec`s via `id.0 as usize`, but
//! callers should prefer [`SimulantId::index`] for clarity.

use std::fmt;

use crate::{CoreError, CoreResult};

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Row of a simulant in the population table.  Ids are never reused
    /// within a run, so the id doubles as a stable randomness key.
    pub struct SimulantId(u32);
}

/// Build a contiguous id range `[start, start + count)`.
///
/// Fails if the range would reach [`SimulantId::INVALID`].
pub fn id_range(start: u32, count: usize) -> CoreResult<Vec<SimulantId>> {
    let end = u32::try_from(count)
        .ok()
        .and_then(|count| start.checked_add(count))
        .ok_or(CoreError::IdOverflow { start, count })?;
    Ok((start..end).map(SimulantId).collect())
}
