//! Component types stored by the entity store

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::sim::contact::ContactLedger;
use crate::sim::movement::PlayerController;
use crate::sim::shape::Shape;

/// Behavior flags on a physical body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityFlags {
    /// Skip gravity in the physics pass
    pub zero_gravity: bool,
    /// Damage tiles on impact and despawn
    pub destroy_blocks: bool,
}

/// Physical body: every entity has one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Lower-left corner of the shape's local frame
    pub position: DVec2,
    pub velocity: DVec2,
    /// `position + velocity` before collision resolution
    pub tentative_position: DVec2,
    pub shape: Shape,
    pub contacts: ContactLedger,
    pub flags: EntityFlags,
}

impl Entity {
    pub fn new(id: EntityId, position: DVec2, shape: Shape) -> Self {
        Self {
            id,
            position,
            velocity: DVec2::ZERO,
            tentative_position: position,
            shape,
            contacts: ContactLedger::new(),
            flags: EntityFlags::default(),
        }
    }

    /// Lower-left corner of the bounding box
    pub fn bounds_min(&self) -> DVec2 {
        self.position + self.shape.offset()
    }

    /// Bounding box extent
    pub fn dim(&self) -> DVec2 {
        self.shape.dim()
    }

    pub fn center(&self) -> DVec2 {
        self.bounds_min() + self.dim() * 0.5
    }
}

/// Player-only state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerData {
    pub controller: PlayerController,
    pub max_stamina: i32,
    pub stamina: i32,
    /// Ticks until the next shot is allowed
    pub fire_cooldown: u32,
}

impl PlayerData {
    pub fn new(max_stamina: i32) -> Self {
        Self {
            controller: PlayerController::new(),
            max_stamina,
            stamina: max_stamina,
            fire_cooldown: 0,
        }
    }
}

/// Projectile that flies straight and breaks tiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireballAi {
    pub owner: Option<EntityId>,
    pub age: u32,
    pub lifetime: u32,
    pub damage: i32,
}

/// Hovering NPC that drifts around its spawn point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireflyAi {
    pub home: DVec2,
}

/// AI behavior; exactly one archetype per entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AiData {
    Fireball(FireballAi),
    Firefly(FireflyAi),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthData {
    pub max_health: i32,
    pub health: i32,
}

impl HealthData {
    pub fn new(max_health: i32) -> Self {
        Self {
            max_health,
            health: max_health,
        }
    }

    /// Apply a signed change, clamped to `[0, max_health]`
    pub fn apply(&mut self, amount: i32) {
        self.health = self.health.saturating_add(amount).clamp(0, self.max_health);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps() {
        let mut h = HealthData::new(20);
        h.apply(-5);
        assert_eq!(h.health, 15);
        h.apply(100);
        assert_eq!(h.health, 20);
        h.apply(-50);
        assert_eq!(h.health, 0);
        assert!(h.is_dead());
    }

    #[test]
    fn test_polygon_body_bounds() {
        let hex = crate::sim::shape::ConvexPolygon::regular(6, 0.2).unwrap();
        let body = Entity::new(EntityId::new(0, 0), DVec2::new(3.0, 4.0), Shape::Polygon(hex));
        assert!((body.bounds_min() - DVec2::new(3.0, 4.0)).length() < 1e-12);
        assert!((body.center() - DVec2::new(3.2, 4.0 + body.dim().y * 0.5)).length() < 1e-12);
    }
}
