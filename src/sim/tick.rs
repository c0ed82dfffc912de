//! Fixed timestep simulation tick
//!
//! One call advances the world by one tick. Passes run in a fixed order and
//! each finishes before the next starts.

use glam::DVec2;
use rand::Rng;

use super::collision::{Collision, ImpactResponse, respond_to_impact};
use super::combat::HealthDelta;
use super::contact::Contact;
use super::grid::{Chunk, Tile, TileCoordinate, list_intersecting_tiles, list_neighbor_tiles};
use super::movement::InputState;
use super::state::{GameEvent, World};
use crate::ecs::{AiData, Entity, EntityId};
use crate::is_finite_point;
use crate::tuning::Tuning;

/// Tile id written by the block placement tool
const PLACED_TILE_ID: u8 = 1;
/// Firefly velocity retained each tick
const FIREFLY_DAMPING: f64 = 0.9;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Intent per controlled entity; players without an entry get a neutral input
    pub players: Vec<(EntityId, InputState)>,
    /// Verdicts from the external hit/hurtbox overlap test
    pub health_deltas: Vec<HealthDelta>,
}

impl TickInput {
    fn for_player(&self, id: EntityId) -> InputState {
        self.players
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, inp)| *inp)
            .unwrap_or_default()
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput) {
    world.events.clear();

    feed_inputs(world, input);
    place_blocks(world);
    run_ai(world);
    update_contacts(world);
    run_controls(world);
    run_physics(world);
    apply_health(world, &input.health_deltas);
    emit_transitions(world);

    world.tick += 1;
    world.save_frame();
}

fn player_ids(world: &World) -> Vec<EntityId> {
    world.ecs.tables().players.iter().map(|(id, _)| id).collect()
}

fn feed_inputs(world: &mut World, input: &TickInput) {
    for (id, player) in world.ecs.tables_mut().players.iter_mut() {
        player.controller.update_inputs(input.for_player(id));
    }
}

/// Fill empty tiles under the pointer while the primary button is held.
///
/// A drag covers the segment from the previous pointer position so fast
/// strokes leave no gaps.
fn place_blocks(world: &mut World) {
    let mut strokes = Vec::new();
    for (_, player) in world.ecs.tables().players.iter() {
        let pc = &player.controller;
        if !pc.inp.mouse_down {
            continue;
        }
        let end = world.camera.to_world(pc.inp.pointer);
        let start = if pc.prev_inp.mouse_down {
            world.camera.to_world(pc.prev_inp.pointer)
        } else {
            end
        };
        strokes.push((start, end));
    }

    let mut tiles = Vec::new();
    for (start, end) in strokes {
        tiles.clear();
        list_intersecting_tiles(start, end, &mut tiles);
        for &tile in &tiles {
            if world.chunk.in_bounds(tile) && !world.chunk.is_solid(tile) {
                world.chunk.set_tile(tile, Tile::solid(PLACED_TILE_ID));
                world.events.push(GameEvent::TilePlaced { tile });
            }
        }
    }
}

fn run_ai(world: &mut World) {
    let ids: Vec<EntityId> = world.ecs.tables().ai.iter().map(|(id, _)| id).collect();
    for id in ids {
        let tables = world.ecs.tables_mut();
        let (Some(ai), Some(body)) = (tables.ai.get_mut(id), tables.entities.get_mut(id)) else {
            continue;
        };
        match ai {
            AiData::Fireball(fb) => {
                fb.age += 1;
                if fb.age >= fb.lifetime {
                    world.despawn(id);
                }
            }
            AiData::Firefly(ff) => {
                let w = world.tuning.firefly_wander;
                let wander = if w > 0.0 {
                    DVec2::new(world.rng.random_range(-w..=w), world.rng.random_range(-w..=w))
                } else {
                    DVec2::ZERO
                };
                let leash = (ff.home - body.position) * world.tuning.firefly_leash;
                body.velocity = body.velocity * FIREFLY_DAMPING + wander + leash;
            }
        }
    }
}

fn update_contacts(world: &mut World) {
    let chunk = &world.chunk;
    for (id, body) in world.ecs.tables_mut().entities.iter_mut() {
        let (pos, dim) = (body.bounds_min(), body.dim());
        let dropped = body.contacts.revalidate(chunk, pos, dim);
        if dropped > 0 {
            log::trace!("entity {id} lost {dropped} contacts");
        }
    }
}

fn run_controls(world: &mut World) {
    let mut shots = Vec::new();
    for id in player_ids(world) {
        let tables = world.ecs.tables_mut();
        let (Some(body), Some(player)) = (tables.entities.get_mut(id), tables.players.get_mut(id)) else {
            continue;
        };
        body.velocity = player
            .controller
            .apply_controls(body.velocity, &body.contacts, &world.tuning);

        player.fire_cooldown = player.fire_cooldown.saturating_sub(1);
        if player.controller.action_pressed() && player.fire_cooldown == 0 {
            player.fire_cooldown = world.tuning.fire_cooldown;
            let dir = f64::from(player.controller.facing);
            shots.push((id, body.center(), DVec2::new(dir * world.tuning.fireball_speed, 0.0)));
        }
    }

    for (owner, center, vel) in shots {
        // Spawn with the hexagon centered on the shooter
        if let Ok(fb) = world.spawn_projectile(center, vel, Some(owner)) {
            if let Some(body) = world.ecs.entity_mut(fb) {
                body.position -= body.dim() * 0.5;
                body.tentative_position = body.position;
            }
        }
    }
}

/// Sweep one body against the terrain and resolve the earliest hit.
///
/// Returns the hit with the tile it struck. Bodies that destroy blocks keep
/// their velocity; the caller handles the tile and the despawn.
fn step_body(
    body: &mut Entity,
    chunk: &Chunk,
    tuning: &Tuning,
    apply_gravity: bool,
    candidates: &mut Vec<TileCoordinate>,
) -> Option<(Collision, TileCoordinate, ImpactResponse)> {
    if apply_gravity {
        body.velocity.y -= tuning.gravity;
    }
    body.velocity = body.contacts.constrain_velocity(body.velocity);

    let p0 = body.position;
    let p1 = p0 + body.velocity;
    if !is_finite_point(p1) {
        log::warn!("entity {} has non-finite motion, stopping it", body.id);
        body.velocity = DVec2::ZERO;
        return None;
    }
    body.tentative_position = p1;

    let lo = body.bounds_min();
    let hi = lo + body.dim();
    candidates.clear();
    list_intersecting_tiles(lo, lo + body.velocity, candidates);
    list_intersecting_tiles(hi, hi + body.velocity, candidates);
    list_neighbor_tiles(lo, candidates);
    list_neighbor_tiles(hi, candidates);

    let mut first: Option<(Collision, TileCoordinate)> = None;
    for &tile in candidates.iter() {
        if !chunk.is_solid(tile) || body.contacts.holds(tile) {
            continue;
        }
        let c = body.shape.time_of_impact(tile, p0, p1);
        let earliest = first.as_ref().map_or(f64::INFINITY, |(f, _)| f.time);
        if c.time >= 0.0 && c.time < earliest {
            first = Some((c, tile));
        }
    }

    let Some((hit, tile)) = first.filter(|(c, _)| c.is_hit()) else {
        body.position = p1;
        return None;
    };

    body.position = hit.position;
    if body.flags.destroy_blocks {
        return Some((hit, tile, ImpactResponse::Slide));
    }
    let (vel, response) = respond_to_impact(
        body.velocity,
        hit.normal,
        tuning.bounce_threshold,
        tuning.bounce_multiplier,
    );
    if response == ImpactResponse::Slide {
        body.contacts.push(Contact::from_collision(&hit, tile));
    }
    body.velocity = vel;
    Some((hit, tile, response))
}

fn run_physics(world: &mut World) {
    let ids = world.ecs.ids();
    let mut candidates = Vec::with_capacity(32);
    for id in ids {
        let tables = world.ecs.tables_mut();
        let is_player = tables.players.contains(id);
        let Some(body) = tables.entities.get_mut(id) else {
            continue;
        };
        let apply_gravity = !is_player && !body.flags.zero_gravity;
        let destroys_blocks = body.flags.destroy_blocks;
        let Some((hit, tile, response)) =
            step_body(body, &world.chunk, &world.tuning, apply_gravity, &mut candidates)
        else {
            continue;
        };

        log::debug!("entity {id} hit {tile:?} at t={:.3} ({response:?})", hit.time);
        world.events.push(GameEvent::Collision {
            entity: id,
            tile,
            position: hit.position,
            normal: hit.normal,
            response,
        });
        if destroys_blocks {
            damage_tile(world, tile);
            world.despawn(id);
        }
    }
}

fn damage_tile(world: &mut World, tile: TileCoordinate) {
    let durability = world.tuning.tile_durability;
    let Some(slot) = world.chunk.tile_mut(tile) else {
        return;
    };
    slot.damage = slot.damage.saturating_add(1);
    if slot.damage >= durability {
        *slot = Tile::EMPTY;
        world.events.push(GameEvent::TileDestroyed { tile });
    } else {
        let damage = slot.damage;
        world.events.push(GameEvent::TileDamaged { tile, damage });
    }
}

/// Apply externally resolved hits; non-players at zero health are removed
fn apply_health(world: &mut World, deltas: &[HealthDelta]) {
    for delta in deltas {
        let Some(health) = world.ecs.health_mut(delta.target) else {
            continue;
        };
        health.apply(delta.amount);
        let dead = health.is_dead();
        if dead && world.ecs.player(delta.target).is_none() {
            world.despawn(delta.target);
        }
    }
}

fn emit_transitions(world: &mut World) {
    for (entity, player) in world.ecs.tables().players.iter() {
        if let Some((from, to)) = player.controller.transition() {
            world.events.push(GameEvent::MovementChanged { entity, from, to });
        }
    }
}
