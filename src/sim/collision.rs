//! Swept time-of-impact against static tiles
//!
//! Two formulations share one contract: find the earliest `t ∈ [0, 1]` at
//! which a shape moving from `p0` to `p1` first touches a tile.
//! - Boxes use the Minkowski-expanded slab test (fast path).
//! - Convex polygons test every polygon vertex against every tile edge and
//!   every tile corner against every polygon edge (general path).
//!
//! Positions are lower-left corners. Resolved positions are pushed
//! `COLLISION_BUFFER` off the surface so the next sweep never starts exactly
//! on a boundary.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::grid::TileCoordinate;
use super::shape::ConvexPolygon;
use crate::consts::{COLLISION_BUFFER, TILE_WIDTH, VELOCITY_EPSILON};
use crate::is_finite_point;

/// Which face of a tile a shape is touching, seen from the shape.
///
/// `Top` means the shape rests on top of the tile (normal points up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactSide {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
}

impl ContactSide {
    pub const ALL: [ContactSide; 4] = [
        ContactSide::Left,
        ContactSide::Right,
        ContactSide::Top,
        ContactSide::Bottom,
    ];

    /// Classify a surface normal by its dominant axis
    pub fn from_normal(normal: DVec2) -> Self {
        if normal.x.abs() > normal.y.abs() {
            if normal.x > 0.0 {
                ContactSide::Right
            } else {
                ContactSide::Left
            }
        } else if normal.y > 0.0 {
            ContactSide::Top
        } else {
            ContactSide::Bottom
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Left/right faces are walls
    #[inline]
    pub fn is_wall(self) -> bool {
        matches!(self, ContactSide::Left | ContactSide::Right)
    }
}

/// Result of a swept query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// Resolved shape position (already offset by the collision buffer)
    pub position: DVec2,
    /// Unit surface normal, pointing out of the tile toward the shape
    pub normal: DVec2,
    pub side: ContactSide,
    /// Fraction of the displacement at first contact; infinite for a miss
    pub time: f64,
}

impl Collision {
    pub fn none() -> Self {
        Self {
            position: DVec2::ZERO,
            normal: DVec2::ZERO,
            side: ContactSide::Top,
            time: f64::INFINITY,
        }
    }

    /// True when first contact happens inside this step
    #[inline]
    pub fn is_hit(&self) -> bool {
        (0.0..=1.0).contains(&self.time)
    }

    fn at(p0: DVec2, delta: DVec2, time: f64, normal: DVec2) -> Self {
        Self {
            position: p0 + delta * time + normal * COLLISION_BUFFER,
            normal,
            side: ContactSide::from_normal(normal),
            time,
        }
    }
}

/// Entry/exit times of a moving coordinate through `[min, min + extent]`.
///
/// A near-zero velocity contributes an unbounded interval when the coordinate
/// is strictly inside the slab and nothing otherwise.
fn slab_interval(p: f64, v: f64, min: f64, extent: f64) -> Option<(f64, f64)> {
    if v.abs() >= VELOCITY_EPSILON {
        let a = (min - p) / v;
        let b = (min + extent - p) / v;
        Some((a.min(b), a.max(b)))
    } else if p > min && p < min + extent {
        Some((f64::NEG_INFINITY, f64::INFINITY))
    } else {
        None
    }
}

/// Swept box vs tile.
///
/// The tile is grown by the box dimensions so the box reduces to its
/// lower-left point. An already-overlapping box reports `t = 0`.
pub fn time_of_impact(tile: TileCoordinate, p0: DVec2, p1: DVec2, dim: DVec2) -> Collision {
    if !is_finite_point(p0) || !is_finite_point(p1) {
        return Collision::none();
    }
    let tile_pos = tile.origin() - dim;
    let tile_dim = DVec2::splat(TILE_WIDTH) + dim;
    let vel = p1 - p0;

    let Some((tx1, tx2)) = slab_interval(p0.x, vel.x, tile_pos.x, tile_dim.x) else {
        return Collision::none();
    };
    let Some((ty1, ty2)) = slab_interval(p0.y, vel.y, tile_pos.y, tile_dim.y) else {
        return Collision::none();
    };

    // The axis whose interval opens last is the face that was hit
    let x_side = tx1 > ty1;
    let start = tx1.max(ty1);
    let end = tx2.min(ty2);
    if end <= start || end < 0.0 || start > 1.0 {
        return Collision::none();
    }

    // Normal opposes the velocity on the hit axis
    let normal = if x_side {
        DVec2::new(if vel.x < 0.0 { 1.0 } else { -1.0 }, 0.0)
    } else {
        DVec2::new(0.0, if vel.y < 0.0 { 1.0 } else { -1.0 })
    };
    Collision::at(p0, vel, start.max(0.0), normal)
}

/// Moving point vs static segment.
///
/// Returns the hit time, the hit point, and the unit segment normal oriented
/// against the motion.
pub fn point_segment_toi(p0: DVec2, p1: DVec2, s0: DVec2, s1: DVec2) -> Option<(f64, DVec2, DVec2)> {
    let delta = p1 - p0;
    let side = s1 - s0;
    let n = DVec2::new(side.y, -side.x);
    let dn = delta.dot(n);
    if dn.abs() < VELOCITY_EPSILON {
        return None;
    }
    let t = n.dot(s0 - p0) / dn;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let hit = p0 + delta * t;
    let along = (hit - s0).dot(side);
    if along < 0.0 || along > side.length_squared() {
        return None;
    }
    let normal = if dn > 0.0 { -n } else { n };
    Some((t, hit, normal.normalize_or_zero()))
}

/// Separating-axis test between a polygon placed at `pos` and a tile.
///
/// Touching boundaries do not count as overlap.
pub fn polygon_overlaps_tile(poly: &ConvexPolygon, tile: TileCoordinate, pos: DVec2) -> bool {
    let corners = tile_corners(tile);
    let tile_axes = [DVec2::X, DVec2::Y];
    let edge_axes = poly.edges().map(|(s0, s1)| outward_normal(s0, s1));
    tile_axes.into_iter().chain(edge_axes).all(|axis| {
        let (a_lo, a_hi) = project(axis, poly.vertices().iter().map(|&v| v + pos));
        let (b_lo, b_hi) = project(axis, corners.iter().copied());
        a_hi.min(b_hi) - a_lo.max(b_lo) > 0.0
    })
}

/// Interval covered by `points` along `axis`
fn project(axis: DVec2, points: impl Iterator<Item = DVec2>) -> (f64, f64) {
    points.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        let d = p.dot(axis);
        (lo.min(d), hi.max(d))
    })
}

/// Tile corners in counter-clockwise order from the lower-left
fn tile_corners(tile: TileCoordinate) -> [DVec2; 4] {
    let origin = tile.origin();
    [
        origin,
        origin + DVec2::new(TILE_WIDTH, 0.0),
        origin + DVec2::splat(TILE_WIDTH),
        origin + DVec2::new(0.0, TILE_WIDTH),
    ]
}

/// Outward normal of a counter-clockwise edge (not normalized)
#[inline]
fn outward_normal(s0: DVec2, s1: DVec2) -> DVec2 {
    let side = s1 - s0;
    DVec2::new(side.y, -side.x)
}

/// Swept convex polygon vs tile.
///
/// Covers the full Minkowski boundary: polygon vertices sweep against tile
/// edges, and tile corners sweep (in the polygon's frame) against polygon
/// edges. Only crossings into the other shape count. A polygon that already
/// overlaps the tile reports `t = 0` with the normal the box sweep of its
/// bounding box would give.
pub fn polygon_time_of_impact(poly: &ConvexPolygon, tile: TileCoordinate, p0: DVec2, p1: DVec2) -> Collision {
    let mut best = Collision::none();
    if !is_finite_point(p0) || !is_finite_point(p1) {
        return best;
    }
    let delta = p1 - p0;

    if polygon_overlaps_tile(poly, tile, p0) {
        let (lo, hi) = poly.bounds();
        let boxed = time_of_impact(tile, p0 + lo, p1 + lo, hi - lo);
        let normal = if boxed.is_hit() {
            boxed.normal
        } else {
            DVec2::new(0.0, -1.0)
        };
        return Collision::at(p0, delta, 0.0, normal);
    }

    let corners = tile_corners(tile);
    let mut consider = |t: f64, normal: DVec2| {
        if t < best.time {
            best = Collision::at(p0, delta, t, normal);
        }
    };

    for (s0, s1) in poly.edges() {
        // Tile corners move by -delta in the polygon's frame
        let entering_poly = delta.dot(outward_normal(s0, s1)) > 0.0;
        for (j, &corner) in corners.iter().enumerate() {
            if entering_poly {
                if let Some((t, _, n)) = point_segment_toi(corner - p0, corner - p1, s0, s1) {
                    consider(t, -n);
                }
            }
            // Polygon vertex moving against a tile edge
            let next = corners[(j + 1) % corners.len()];
            if delta.dot(outward_normal(corner, next)) < 0.0 {
                if let Some((t, _, n)) = point_segment_toi(s0 + p0, s0 + p1, corner, next) {
                    consider(t, n);
                }
            }
        }
    }
    best
}

/// Remove the part of `v` that pushes into a surface; outward motion is kept
#[inline]
pub fn constrained_surface_vel(v: DVec2, normal: DVec2) -> DVec2 {
    let normal_vel = v.dot(normal).min(0.0);
    v - normal * normal_vel
}

/// How a collision changed the velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactResponse {
    /// Normal component removed; the surface becomes a contact
    Slide,
    /// Normal component reflected and amplified
    Bounce,
}

/// Slide along the surface for gentle impacts, bounce for hard ones
pub fn respond_to_impact(
    vel: DVec2,
    normal: DVec2,
    bounce_threshold: f64,
    bounce_multiplier: f64,
) -> (DVec2, ImpactResponse) {
    let normal_vel = vel.dot(normal);
    if normal_vel >= bounce_threshold {
        (vel - normal * normal_vel, ImpactResponse::Slide)
    } else {
        (vel - normal * normal_vel * bounce_multiplier, ImpactResponse::Bounce)
    }
}
