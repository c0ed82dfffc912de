//! Entity footprints: axis-aligned boxes and small convex polygons

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::collision::{Collision, polygon_time_of_impact, time_of_impact};
use super::grid::TileCoordinate;
use crate::consts::MAX_POLYGON_VERTICES;
use crate::is_finite_point;

/// Convex polygon with vertices relative to the owning entity's position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvexPolygon {
    vertices: [DVec2; MAX_POLYGON_VERTICES],
    len: usize,
}

impl ConvexPolygon {
    /// Build from 3..=6 finite vertices in boundary order.
    ///
    /// Rejects concave, degenerate and self-intersecting outlines. Clockwise
    /// input is stored counter-clockwise.
    pub fn new(vertices: &[DVec2]) -> Option<Self> {
        let len = vertices.len();
        if !(3..=MAX_POLYGON_VERTICES).contains(&len) {
            return None;
        }
        if !vertices.iter().all(|&v| is_finite_point(v)) {
            return None;
        }

        let mut winding = 0.0;
        let mut turning = 0.0;
        for i in 0..len {
            let e0 = vertices[(i + 1) % len] - vertices[i];
            let e1 = vertices[(i + 2) % len] - vertices[(i + 1) % len];
            let cross = e0.perp_dot(e1);
            if cross == 0.0 || winding * cross < 0.0 {
                return None;
            }
            winding = cross.signum();
            turning += cross.atan2(e0.dot(e1));
        }
        // A star turns the same way at every corner but winds more than once
        if (turning.abs() - std::f64::consts::TAU).abs() > 1e-6 {
            return None;
        }

        let mut storage = [DVec2::ZERO; MAX_POLYGON_VERTICES];
        storage[..len].copy_from_slice(vertices);
        if winding < 0.0 {
            storage[..len].reverse();
        }
        Some(Self { vertices: storage, len })
    }

    /// Rectangle with its lower-left corner at the entity position
    pub fn from_box(dim: DVec2) -> Self {
        Self {
            vertices: [
                DVec2::ZERO,
                DVec2::new(dim.x, 0.0),
                dim,
                DVec2::new(0.0, dim.y),
                DVec2::ZERO,
                DVec2::ZERO,
            ],
            len: 4,
        }
    }

    /// Regular n-gon (3..=6 sides) inscribed in a circle of `radius`,
    /// positioned so its bounding box starts at the entity position
    pub fn regular(sides: usize, radius: f64) -> Option<Self> {
        if !(3..=MAX_POLYGON_VERTICES).contains(&sides) || radius <= 0.0 {
            return None;
        }
        let mut points = [DVec2::ZERO; MAX_POLYGON_VERTICES];
        for (i, p) in points.iter_mut().take(sides).enumerate() {
            let theta = std::f64::consts::TAU * i as f64 / sides as f64;
            *p = DVec2::new(theta.cos(), theta.sin()) * radius;
        }
        let poly = Self::new(&points[..sides])?;
        let (min, _) = poly.bounds();
        Some(poly.translated(-min))
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices[..self.len]
    }

    /// Consecutive vertex pairs, wrapping around
    pub fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        let verts = self.vertices();
        (0..verts.len()).map(move |i| (verts[i], verts[(i + 1) % verts.len()]))
    }

    /// Bounding box (min, max) relative to the entity position
    pub fn bounds(&self) -> (DVec2, DVec2) {
        self.vertices().iter().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        )
    }

    fn translated(mut self, offset: DVec2) -> Self {
        for v in self.vertices.iter_mut().take(self.len) {
            *v += offset;
        }
        self
    }
}

/// Collision footprint of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned box with its lower-left corner at the entity position
    Box { dim: DVec2 },
    Polygon(ConvexPolygon),
}

impl Shape {
    pub fn square(side: f64) -> Self {
        Shape::Box {
            dim: DVec2::splat(side),
        }
    }

    /// Offset from the entity position to the bounding box's lower-left corner
    pub fn offset(&self) -> DVec2 {
        match self {
            Shape::Box { .. } => DVec2::ZERO,
            Shape::Polygon(poly) => poly.bounds().0,
        }
    }

    /// Bounding box extent
    pub fn dim(&self) -> DVec2 {
        match self {
            Shape::Box { dim } => *dim,
            Shape::Polygon(poly) => {
                let (lo, hi) = poly.bounds();
                hi - lo
            }
        }
    }

    /// Sweep this shape from `p0` to `p1` against a tile
    pub fn time_of_impact(&self, tile: TileCoordinate, p0: DVec2, p1: DVec2) -> Collision {
        match self {
            Shape::Box { dim } => time_of_impact(tile, p0, p1, *dim),
            Shape::Polygon(poly) => polygon_time_of_impact(poly, tile, p0, p1),
        }
    }
}
