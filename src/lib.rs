//! Tilebound - deterministic tile platformer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid math, swept collision, contacts, movement, tick)
//! - `ecs`: Rollback-capable sparse-set entity store
//! - `tuning`: Data-driven movement and combat constants

pub mod ecs;
pub mod sim;
pub mod tuning;

pub use ecs::{EcsError, EntityId, RollbackEcs};
pub use tuning::{Tuning, TuningError};

use glam::DVec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation rate (ticks per second)
    pub const SIM_HZ: u32 = 50;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f64 = 1.0 / SIM_HZ as f64;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Side length of a tile in world units
    pub const TILE_WIDTH: f64 = 1.0;
    /// Tiles per chunk edge
    pub const CHUNK_TILES: i32 = 32;
    /// Chunk side length in world units
    pub const CHUNK_WIDTH: f64 = TILE_WIDTH * CHUNK_TILES as f64;

    /// Collisions resolve this far from the surface
    pub const COLLISION_BUFFER: f64 = 1e-2;
    /// Contacts are maintained while within this distance of the surface
    pub const CONTACT_BUFFER: f64 = 2e-2;
    /// Velocities below this are treated as zero by the slab test
    pub const VELOCITY_EPSILON: f64 = 1e-9;

    /// Convex polygons are limited to this many vertices
    pub const MAX_POLYGON_VERTICES: usize = 6;
    /// Default entity capacity of the store
    pub const MAX_ENTITIES: usize = 1024;

    /// Default player footprint
    pub const PLAYER_DIM: f64 = 0.5;
    /// Default player health
    pub const PLAYER_HEALTH: i32 = 100;
    /// Default player stamina
    pub const PLAYER_STAMINA: i32 = 100;
    /// Default NPC health
    pub const NPC_HEALTH: i32 = 20;
}

/// True if both components are finite (not NaN or infinite)
#[inline]
pub fn is_finite_point(p: DVec2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Map a signed input axis (-1/0/1) to a direction multiplier
#[inline]
pub fn axis_sign(axis: i8) -> f64 {
    match axis.signum() {
        1 => 1.0,
        -1 => -1.0,
        _ => 0.0,
    }
}
