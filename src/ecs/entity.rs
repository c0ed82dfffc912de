//! Entity ids
//!
//! An id is a slot index plus a generation counter. Reusing a slot bumps its
//! generation so stale ids held elsewhere stop resolving.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generational entity handle
///
/// - Lower 32 bits: slot index into the sparse maps
/// - Upper 32 bits: generation of that slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Slot index as a `usize` for table lookups
    #[inline]
    pub const fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}
