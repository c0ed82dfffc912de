//! Entity store errors

use thiserror::Error;

use super::EntityId;

/// Failures the store reports instead of panicking
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Every id is in use
    #[error("entity store exhausted: capacity {capacity}")]
    Exhausted {
        /// Maximum number of live entities
        capacity: usize,
    },

    /// The id was deleted or never allocated
    #[error("stale entity id {0}")]
    StaleEntity(EntityId),

    /// Rollback asked for a frame that is no longer retained
    #[error("rollback of {requested} frames requested, {available} retained")]
    HistoryTooShort {
        requested: usize,
        available: usize,
    },
}
