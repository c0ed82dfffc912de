//! Rollback entity store
//!
//! One sparse-set table per component kind, an id allocator with generation
//! counters, and a ring of compacted snapshots for rewinding.

use glam::DVec2;

use super::components::{AiData, Entity, FireballAi, FireflyAi, HealthData, PlayerData};
use super::{EcsError, EntityId, RollbackBuffer, SparseSet};
use crate::consts::{NPC_HEALTH, PLAYER_DIM, PLAYER_HEALTH, PLAYER_STAMINA};
use crate::sim::shape::{ConvexPolygon, Shape};
use crate::tuning::Tuning;

/// Fireball hexagon radius
const FIREBALL_RADIUS: f64 = 0.15;
/// Firefly box side
const FIREFLY_DIM: f64 = 0.3;

/// Component tables plus allocator state: everything a snapshot captures
#[derive(Debug, Clone, Default)]
pub struct EcsTables {
    pub entities: SparseSet<Entity>,
    pub players: SparseSet<PlayerData>,
    pub ai: SparseSet<AiData>,
    pub health: SparseSet<HealthData>,
    generations: Vec<u32>,
    alive: Vec<bool>,
    /// Reused last-in first-out
    free_ids: Vec<u32>,
}

impl EcsTables {
    fn compact(&mut self) {
        self.entities.compact();
        self.players.compact();
        self.ai.compact();
        self.health.compact();
    }
}

#[derive(Debug, Clone)]
pub struct RollbackEcs {
    tables: EcsTables,
    history: RollbackBuffer<EcsTables>,
    max_entities: usize,
}

impl RollbackEcs {
    pub fn new(max_entities: usize, rollback_depth: usize) -> Self {
        Self {
            tables: EcsTables::default(),
            history: RollbackBuffer::new(rollback_depth),
            max_entities,
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_entities
    }

    pub fn tables(&self) -> &EcsTables {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut EcsTables {
        &mut self.tables
    }

    /// Allocate an id, reusing the most recently freed slot first
    pub fn new_entity(&mut self) -> Result<EntityId, EcsError> {
        let t = &mut self.tables;
        if let Some(slot) = t.free_ids.pop() {
            let i = slot as usize;
            t.generations[i] = t.generations[i].wrapping_add(1);
            t.alive[i] = true;
            return Ok(EntityId::new(slot, t.generations[i]));
        }
        let slot = t.generations.len();
        if slot >= self.max_entities {
            log::warn!("entity store full ({} entities)", self.max_entities);
            return Err(EcsError::Exhausted {
                capacity: self.max_entities,
            });
        }
        t.generations.push(0);
        t.alive.push(true);
        Ok(EntityId::new(slot as u32, 0))
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        let t = &self.tables;
        t.alive.get(id.slot()).copied().unwrap_or(false) && t.generations[id.slot()] == id.generation()
    }

    /// Detach every component of `id` and free its slot; rows are reclaimed on the next `save_update`
    pub fn delete_entity(&mut self, id: EntityId) -> Result<(), EcsError> {
        if !self.is_alive(id) {
            return Err(EcsError::StaleEntity(id));
        }
        let t = &mut self.tables;
        t.entities.remove(id);
        t.players.remove(id);
        t.ai.remove(id);
        t.health.remove(id);
        t.alive[id.slot()] = false;
        t.free_ids.push(id.index());
        Ok(())
    }

    /// Live ids in body-table order
    pub fn ids(&self) -> Vec<EntityId> {
        self.tables.entities.iter().map(|(id, _)| id).collect()
    }

    pub fn live_count(&self) -> usize {
        self.tables.alive.iter().filter(|a| **a).count()
    }

    pub fn free_ids(&self) -> &[u32] {
        &self.tables.free_ids
    }

    /// Current generation of a slot, if it was ever allocated
    pub fn generation(&self, slot: u32) -> Option<u32> {
        self.tables.generations.get(slot as usize).copied()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.tables.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.tables.entities.get_mut(id)
    }

    pub fn player(&self, id: EntityId) -> Option<&PlayerData> {
        self.tables.players.get(id)
    }

    pub fn player_mut(&mut self, id: EntityId) -> Option<&mut PlayerData> {
        self.tables.players.get_mut(id)
    }

    pub fn ai(&self, id: EntityId) -> Option<&AiData> {
        self.tables.ai.get(id)
    }

    pub fn health(&self, id: EntityId) -> Option<&HealthData> {
        self.tables.health.get(id)
    }

    pub fn health_mut(&mut self, id: EntityId) -> Option<&mut HealthData> {
        self.tables.health.get_mut(id)
    }

    pub fn spawn_player(&mut self, pos: DVec2) -> Result<EntityId, EcsError> {
        let id = self.new_entity()?;
        let t = &mut self.tables;
        t.entities.insert(id, Entity::new(id, pos, Shape::square(PLAYER_DIM)));
        t.players.insert(id, PlayerData::new(PLAYER_STAMINA));
        t.health.insert(id, HealthData::new(PLAYER_HEALTH));
        Ok(id)
    }

    pub fn spawn_projectile(
        &mut self,
        pos: DVec2,
        vel: DVec2,
        owner: Option<EntityId>,
        tuning: &Tuning,
    ) -> Result<EntityId, EcsError> {
        let shape = ConvexPolygon::regular(6, FIREBALL_RADIUS)
            .map(Shape::Polygon)
            .unwrap_or(Shape::square(FIREBALL_RADIUS * 2.0));
        let id = self.new_entity()?;
        let mut body = Entity::new(id, pos, shape);
        body.velocity = vel;
        body.flags.zero_gravity = true;
        body.flags.destroy_blocks = true;

        let t = &mut self.tables;
        t.entities.insert(id, body);
        t.ai.insert(
            id,
            AiData::Fireball(FireballAi {
                owner,
                age: 0,
                lifetime: tuning.fireball_lifetime,
                damage: tuning.fireball_damage,
            }),
        );
        Ok(id)
    }

    pub fn spawn_npc(&mut self, pos: DVec2) -> Result<EntityId, EcsError> {
        let id = self.new_entity()?;
        let mut body = Entity::new(id, pos, Shape::square(FIREFLY_DIM));
        body.flags.zero_gravity = true;

        let t = &mut self.tables;
        t.entities.insert(id, body);
        t.ai.insert(id, AiData::Firefly(FireflyAi { home: pos }));
        t.health.insert(id, HealthData::new(NPC_HEALTH));
        Ok(id)
    }

    /// Compact every table and retain the result as the newest rollback frame
    pub fn save_update(&mut self) {
        self.tables.compact();
        self.history.push(self.tables.clone());
    }

    /// Restore the frame saved `frames_back` updates before the newest (0 = newest).
    ///
    /// Newer frames are discarded.
    pub fn rollback(&mut self, frames_back: usize) -> Result<(), EcsError> {
        let available = self.history.len();
        match self.history.rewind(frames_back) {
            Some(frame) => {
                self.tables = frame.clone();
                Ok(())
            }
            None => Err(EcsError::HistoryTooShort {
                requested: frames_back,
                available,
            }),
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Default for RollbackEcs {
    fn default() -> Self {
        Self::new(crate::consts::MAX_ENTITIES, Tuning::default().rollback_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_spawn_player_components() {
        let mut ecs = RollbackEcs::default();
        let id = ecs.spawn_player(DVec2::new(2.0, 3.0)).unwrap();
        assert!(ecs.entity(id).is_some());
        assert!(ecs.player(id).is_some());
        assert_eq!(ecs.health(id).unwrap().health, PLAYER_HEALTH);
        assert!(ecs.ai(id).is_none());
    }

    #[test]
    fn test_projectile_and_npc_archetypes() {
        let mut ecs = RollbackEcs::default();
        let tuning = Tuning::default();
        let fb = ecs
            .spawn_projectile(DVec2::ZERO, DVec2::new(0.3, 0.0), None, &tuning)
            .unwrap();
        let body = ecs.entity(fb).unwrap();
        assert!(body.flags.zero_gravity && body.flags.destroy_blocks);
        assert!(matches!(body.shape, Shape::Polygon(_)));
        assert!(matches!(ecs.ai(fb), Some(AiData::Fireball(_))));
        assert!(ecs.health(fb).is_none());

        let npc = ecs.spawn_npc(DVec2::new(5.0, 5.0)).unwrap();
        assert!(matches!(ecs.ai(npc), Some(AiData::Firefly(f)) if f.home == DVec2::new(5.0, 5.0)));
        assert!(ecs.health(npc).is_some());
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let mut ecs = RollbackEcs::new(2, 4);
        ecs.new_entity().unwrap();
        ecs.new_entity().unwrap();
        assert_eq!(ecs.new_entity(), Err(EcsError::Exhausted { capacity: 2 }));
    }

    #[test]
    fn test_delete_and_reuse_bumps_generation() {
        let mut ecs = RollbackEcs::default();
        let a = ecs.spawn_player(DVec2::ZERO).unwrap();
        let b = ecs.spawn_npc(DVec2::ONE).unwrap();
        ecs.delete_entity(a).unwrap();
        assert!(!ecs.is_alive(a));
        assert!(ecs.entity(a).is_none());
        assert_eq!(ecs.delete_entity(a), Err(EcsError::StaleEntity(a)));

        let c = ecs.spawn_npc(DVec2::ZERO).unwrap();
        assert_eq!(c.index(), a.index());
        assert!(c.generation() > a.generation());
        assert!(ecs.is_alive(b));
    }

    #[test]
    fn test_save_update_drops_dead_rows() {
        let mut ecs = RollbackEcs::default();
        let a = ecs.spawn_player(DVec2::ZERO).unwrap();
        ecs.spawn_npc(DVec2::ONE).unwrap();
        ecs.delete_entity(a).unwrap();
        assert_eq!(ecs.tables().entities.dense_len(), 2);
        ecs.save_update();
        let t = ecs.tables();
        assert_eq!(t.entities.dense_len(), 1);
        assert!(t.entities.is_compact() && t.players.is_compact());
        assert!(t.ai.is_compact() && t.health.is_compact());
    }

    #[test]
    fn test_rollback_restores_frame() {
        let mut ecs = RollbackEcs::default();
        let a = ecs.spawn_player(DVec2::ZERO).unwrap();
        ecs.save_update();
        ecs.entity_mut(a).unwrap().position = DVec2::new(9.0, 9.0);
        let b = ecs.spawn_npc(DVec2::ONE).unwrap();
        ecs.save_update();

        ecs.rollback(1).unwrap();
        assert_eq!(ecs.entity(a).unwrap().position, DVec2::ZERO);
        assert!(!ecs.is_alive(b));
        assert_eq!(ecs.history_len(), 1);
        assert_eq!(
            ecs.rollback(3),
            Err(EcsError::HistoryTooShort {
                requested: 3,
                available: 1
            })
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Spawn,
        Delete(usize),
        Save,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Spawn),
            2 => (0usize..32).prop_map(Op::Delete),
            1 => Just(Op::Save),
        ]
    }

    proptest! {
        #[test]
        fn prop_ecs_round_trip(ops in prop::collection::vec(op(), 0..80)) {
            let mut ecs = RollbackEcs::new(24, 4);
            let mut live: Vec<EntityId> = Vec::new();
            for op in ops {
                match op {
                    Op::Spawn => {
                        if let Ok(id) = ecs.spawn_npc(DVec2::ZERO) {
                            live.push(id);
                        }
                    }
                    Op::Delete(i) if !live.is_empty() => {
                        let id = live.swap_remove(i % live.len());
                        prop_assert!(ecs.delete_entity(id).is_ok());
                    }
                    Op::Delete(_) => {}
                    Op::Save => ecs.save_update(),
                }
            }
            ecs.save_update();
            let t = ecs.tables();
            prop_assert!(t.entities.is_compact());
            prop_assert!(t.ai.is_compact());
            prop_assert!(t.health.is_compact());
            prop_assert_eq!(t.entities.dense_len(), live.len());
            for id in &live {
                prop_assert_eq!(ecs.entity(*id).map(|e| e.id), Some(*id));
            }
        }

        #[test]
        fn prop_reuse_has_greater_generation(spawns in 1usize..16, victim in 0usize..16) {
            let mut ecs = RollbackEcs::new(32, 2);
            let ids: Vec<_> = (0..spawns).map(|_| ecs.spawn_npc(DVec2::ZERO).unwrap()).collect();
            let k = ids[victim % ids.len()];
            ecs.delete_entity(k).unwrap();
            let reused = ecs.spawn_npc(DVec2::ZERO).unwrap();
            prop_assert_eq!(reused.index(), k.index());
            prop_assert!(reused.generation() > k.generation());
        }
    }
}
