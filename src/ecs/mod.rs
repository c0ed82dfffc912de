//! Rollback-capable sparse-set entity store

pub mod components;
mod entity;
mod error;
mod rollback;
mod sparse_set;
mod store;

pub use components::{AiData, Entity, EntityFlags, FireballAi, FireflyAi, HealthData, PlayerData};
pub use entity::EntityId;
pub use error::EcsError;
pub use rollback::RollbackBuffer;
pub use sparse_set::SparseSet;
pub use store::{EcsTables, RollbackEcs};
