//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (dense table order)
//! - No rendering or platform dependencies

pub mod camera;
pub mod clock;
pub mod collision;
pub mod combat;
pub mod contact;
pub mod grid;
pub mod movement;
pub mod shape;
pub mod state;
pub mod tick;

pub use camera::Camera;
pub use clock::FixedClock;
pub use collision::{Collision, ContactSide, ImpactResponse, time_of_impact};
pub use combat::{HealthDelta, Hitbox, Hurtbox};
pub use contact::{Contact, ContactLedger};
pub use grid::{Chunk, Tile, TileCoordinate, list_intersecting_tiles, list_neighbor_tiles, list_tile_neighbors, tile_of};
pub use movement::{InputState, MovementState, PlayerController};
pub use shape::{ConvexPolygon, Shape};
pub use state::{GameEvent, SpawnKind, World};
pub use tick::{TickInput, tick};
