//! Combat boundary types
//!
//! The simulation publishes hurtboxes and hitboxes each tick. Overlap testing
//! happens outside; its verdicts come back as `HealthDelta`s.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::ecs::EntityId;

/// Region of an entity that can take damage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hurtbox {
    pub owner: EntityId,
    pub pos: DVec2,
    pub dim: DVec2,
    pub vel: DVec2,
}

/// Region of an entity that deals damage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub owner: EntityId,
    /// Entity that fired this hitbox, if any; it should not be hit by it
    pub source: Option<EntityId>,
    pub pos: DVec2,
    pub dim: DVec2,
    pub damage: i32,
}

/// Health change for one entity, negative for damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDelta {
    pub target: EntityId,
    pub amount: i32,
}
