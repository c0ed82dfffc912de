//! World state and simulation events
//!
//! Everything a rollback has to restore lives here: terrain, entity tables,
//! RNG and the tick counter.

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::camera::Camera;
use super::collision::ImpactResponse;
use super::combat::{Hitbox, Hurtbox};
use super::grid::{Chunk, TileCoordinate};
use super::movement::MovementState;
use crate::consts::MAX_ENTITIES;
use crate::ecs::{AiData, EcsError, EntityId, RollbackBuffer, RollbackEcs};
use crate::tuning::Tuning;

/// Archetype of a spawned entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Player,
    Projectile,
    Npc,
}

/// Discrete happenings of one tick, for cosmetic and audio consumers
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    MovementChanged {
        entity: EntityId,
        from: MovementState,
        to: MovementState,
    },
    Collision {
        entity: EntityId,
        tile: TileCoordinate,
        position: DVec2,
        normal: DVec2,
        response: ImpactResponse,
    },
    TilePlaced {
        tile: TileCoordinate,
    },
    TileDamaged {
        tile: TileCoordinate,
        damage: u8,
    },
    TileDestroyed {
        tile: TileCoordinate,
    },
    Spawned {
        entity: EntityId,
        kind: SpawnKind,
    },
    Despawned {
        entity: EntityId,
    },
    /// A spawn was requested but the store refused it
    SpawnSkipped {
        kind: SpawnKind,
        reason: EcsError,
    },
}

/// Non-ECS state captured per tick
#[derive(Debug, Clone)]
struct WorldFrame {
    chunk: Chunk,
    rng: Pcg32,
    tick: u64,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tick: u64,
    pub chunk: Chunk,
    pub ecs: RollbackEcs,
    pub tuning: Tuning,
    pub camera: Camera,
    /// Events raised by the most recent tick
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
    history: RollbackBuffer<WorldFrame>,
}

impl World {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let depth = tuning.rollback_depth;
        Self {
            seed,
            tick: 0,
            chunk: Chunk::default(),
            ecs: RollbackEcs::new(MAX_ENTITIES, depth),
            tuning,
            camera: Camera::default(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            history: RollbackBuffer::new(depth),
        }
    }

    fn record_spawn(&mut self, kind: SpawnKind, result: Result<EntityId, EcsError>) -> Result<EntityId, EcsError> {
        match &result {
            Ok(entity) => self.events.push(GameEvent::Spawned { entity: *entity, kind }),
            Err(reason) => {
                log::warn!("{kind:?} spawn skipped: {reason}");
                self.events.push(GameEvent::SpawnSkipped {
                    kind,
                    reason: reason.clone(),
                });
            }
        }
        result
    }

    pub fn spawn_player(&mut self, pos: DVec2) -> Result<EntityId, EcsError> {
        let result = self.ecs.spawn_player(pos);
        self.record_spawn(SpawnKind::Player, result)
    }

    pub fn spawn_projectile(&mut self, pos: DVec2, vel: DVec2, owner: Option<EntityId>) -> Result<EntityId, EcsError> {
        let result = self.ecs.spawn_projectile(pos, vel, owner, &self.tuning);
        self.record_spawn(SpawnKind::Projectile, result)
    }

    pub fn spawn_npc(&mut self, pos: DVec2) -> Result<EntityId, EcsError> {
        let result = self.ecs.spawn_npc(pos);
        self.record_spawn(SpawnKind::Npc, result)
    }

    /// Delete an entity and announce it; stale ids are ignored
    pub fn despawn(&mut self, entity: EntityId) {
        if self.ecs.delete_entity(entity).is_ok() {
            self.events.push(GameEvent::Despawned { entity });
        }
    }

    /// Damageable regions of every entity with health
    pub fn hurtboxes(&self) -> Vec<Hurtbox> {
        let tables = self.ecs.tables();
        tables
            .entities
            .iter()
            .filter(|(id, _)| tables.health.contains(*id))
            .map(|(id, body)| Hurtbox {
                owner: id,
                pos: body.bounds_min(),
                dim: body.dim(),
                vel: body.velocity,
            })
            .collect()
    }

    /// Damaging regions of every fireball
    pub fn hitboxes(&self) -> Vec<Hitbox> {
        let tables = self.ecs.tables();
        tables
            .entities
            .iter()
            .filter_map(|(id, body)| match tables.ai.get(id) {
                Some(AiData::Fireball(fb)) => Some(Hitbox {
                    owner: id,
                    source: fb.owner,
                    pos: body.bounds_min(),
                    dim: body.dim(),
                    damage: fb.damage,
                }),
                _ => None,
            })
            .collect()
    }

    /// Compact the entity store and retain this tick as a rollback frame
    pub fn save_frame(&mut self) {
        self.ecs.save_update();
        self.history.push(WorldFrame {
            chunk: self.chunk.clone(),
            rng: self.rng.clone(),
            tick: self.tick,
        });
    }

    /// Number of frames available to `rollback`
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Rewind entities, terrain, RNG and tick counter to a saved frame
    /// (0 = the most recent `save_frame`). Newer frames are discarded.
    pub fn rollback(&mut self, frames_back: usize) -> Result<(), EcsError> {
        let available = self.history.len().min(self.ecs.history_len());
        if frames_back >= available {
            return Err(EcsError::HistoryTooShort {
                requested: frames_back,
                available,
            });
        }
        self.ecs.rollback(frames_back)?;
        if let Some(frame) = self.history.rewind(frames_back) {
            self.chunk = frame.chunk.clone();
            self.rng = frame.rng.clone();
            self.tick = frame.tick;
        }
        self.events.clear();
        log::info!("rolled back {frames_back} frames to tick {}", self.tick);
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(0, Tuning::default())
    }
}
