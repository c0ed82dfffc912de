//! Tile grid geometry and broad-phase rasterization
//!
//! Tiles are unit squares addressed by (row, col) with row growing upward
//! (+y) and col growing rightward (+x). A chunk is a dense 32x32 block of
//! tiles stored row-major. These functions only enumerate *candidate* tiles;
//! callers still check bounds and solidity before trusting one.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::{CHUNK_TILES, TILE_WIDTH};
use crate::is_finite_point;

/// Longest segment (in tiles along the main axis) the rasterizer will walk
pub const MAX_RASTER_SPAN: f64 = 4096.0;
/// Largest tile coordinate magnitude the scans accept; keeps the
/// `floor() as i32` casts clear of saturation
pub const MAX_TILE_COORDINATE: f64 = (i32::MAX / 2) as f64;

#[inline]
fn within_grid(p: DVec2) -> bool {
    (p / TILE_WIDTH).abs().max_element() <= MAX_TILE_COORDINATE
}

/// Integer grid address of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileCoordinate {
    pub row: i32,
    pub col: i32,
    pub chunk_row: i32,
    pub chunk_col: i32,
}

impl TileCoordinate {
    /// Tile in the active chunk (0, 0)
    pub const fn new(row: i32, col: i32) -> Self {
        Self {
            row,
            col,
            chunk_row: 0,
            chunk_col: 0,
        }
    }

    /// World-space lower-left corner of the tile
    #[inline]
    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.col as f64, self.row as f64) * TILE_WIDTH
    }

    /// Same chunk, offset by (drow, dcol)
    #[inline]
    pub fn offset(&self, drow: i32, dcol: i32) -> Self {
        Self {
            row: self.row.saturating_add(drow),
            col: self.col.saturating_add(dcol),
            ..*self
        }
    }

    /// Manhattan distance in tiles (ignores chunk fields)
    #[inline]
    pub fn manhattan(&self, other: &TileCoordinate) -> u32 {
        self.row
            .abs_diff(other.row)
            .saturating_add(self.col.abs_diff(other.col))
    }
}

/// A single tile; `tile_id == 0` is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tile {
    pub tile_id: u8,
    pub damage: u8,
}

impl Tile {
    pub const EMPTY: Tile = Tile {
        tile_id: 0,
        damage: 0,
    };

    pub const fn solid(tile_id: u8) -> Self {
        Self { tile_id, damage: 0 }
    }

    #[inline]
    pub fn is_solid(&self) -> bool {
        self.tile_id > 0
    }

    /// Index into the tile sheet, `None` for empty tiles
    pub fn sprite_index(&self) -> Option<u8> {
        self.tile_id.checked_sub(1)
    }
}

/// Dense 32x32 block of tiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub row: i32,
    pub col: i32,
    tiles: Vec<Tile>,
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Chunk {
    /// Empty chunk at the given chunk address
    pub fn new(row: i32, col: i32) -> Self {
        Self {
            row,
            col,
            tiles: vec![Tile::EMPTY; (CHUNK_TILES * CHUNK_TILES) as usize],
        }
    }

    /// Row-major index of a coordinate, `None` when outside this chunk
    pub fn index_of(&self, coord: TileCoordinate) -> Option<usize> {
        let inside = coord.chunk_row == self.row
            && coord.chunk_col == self.col
            && (0..CHUNK_TILES).contains(&coord.row)
            && (0..CHUNK_TILES).contains(&coord.col);
        inside.then(|| (coord.row * CHUNK_TILES + coord.col) as usize)
    }

    #[inline]
    pub fn in_bounds(&self, coord: TileCoordinate) -> bool {
        self.index_of(coord).is_some()
    }

    pub fn tile(&self, coord: TileCoordinate) -> Option<Tile> {
        self.index_of(coord).map(|i| self.tiles[i])
    }

    pub fn tile_mut(&mut self, coord: TileCoordinate) -> Option<&mut Tile> {
        self.index_of(coord).map(move |i| &mut self.tiles[i])
    }

    /// Bounds-checked solidity; out-of-range coordinates are never solid
    #[inline]
    pub fn is_solid(&self, coord: TileCoordinate) -> bool {
        self.tile(coord).is_some_and(|t| t.is_solid())
    }

    /// Overwrite a tile. Returns false when the coordinate is out of range.
    pub fn set_tile(&mut self, coord: TileCoordinate, tile: Tile) -> bool {
        match self.tile_mut(coord) {
            Some(slot) => {
                *slot = tile;
                true
            }
            None => false,
        }
    }

    /// Fill a rectangle of tiles (inclusive bounds, clipped to the chunk)
    pub fn fill(&mut self, rows: std::ops::RangeInclusive<i32>, cols: std::ops::RangeInclusive<i32>, tile: Tile) {
        for row in rows {
            for col in cols.clone() {
                self.set_tile(self.local(row, col), tile);
            }
        }
    }

    /// Coordinate of (row, col) inside this chunk
    #[inline]
    pub fn local(&self, row: i32, col: i32) -> TileCoordinate {
        TileCoordinate {
            row,
            col,
            chunk_row: self.row,
            chunk_col: self.col,
        }
    }

    /// All solid tiles in row-major order
    pub fn solid_tiles(&self) -> impl Iterator<Item = (TileCoordinate, Tile)> + '_ {
        self.tiles.iter().enumerate().filter(|(_, t)| t.is_solid()).map(|(i, t)| {
            let i = i as i32;
            (self.local(i / CHUNK_TILES, i % CHUNK_TILES), *t)
        })
    }
}

/// Tile containing a continuous point (floor division by tile width)
#[inline]
pub fn tile_of(point: DVec2) -> TileCoordinate {
    let p = point / TILE_WIDTH;
    TileCoordinate::new(p.y.floor() as i32, p.x.floor() as i32)
}

/// Append every tile touched by the segment `start -> end`.
///
/// Supercover line walk: the main axis is the one with the larger extent;
/// each main-axis column emits the tile where the line enters it and, if the
/// secondary coordinate crosses a tile boundary inside that column, the tile
/// where it leaves. The extra tile keeps fast shapes from slipping between
/// diagonally touching tiles.
pub fn list_intersecting_tiles(start: DVec2, end: DVec2, out: &mut Vec<TileCoordinate>) {
    if !is_finite_point(start) || !is_finite_point(end) {
        log::warn!("Non-finite segment {start:?} -> {end:?} rejected by rasterizer");
        return;
    }
    if !within_grid(start) || !within_grid(end) {
        log::warn!("Segment {start:?} -> {end:?} lies outside the tile grid, rejected");
        return;
    }

    let mut s = start / TILE_WIDTH;
    let mut e = end / TILE_WIDTH;
    let extent = (e - s).abs();
    if extent.max_element() > MAX_RASTER_SPAN {
        log::warn!("Segment {start:?} -> {end:?} spans too many tiles, rejected");
        return;
    }

    // Walk along the axis with the greater extent
    let steep = extent.y > extent.x;
    if steep {
        s = DVec2::new(s.y, s.x);
        e = DVec2::new(e.y, e.x);
    }
    if s.x > e.x {
        std::mem::swap(&mut s, &mut e);
    }

    let delta = e - s;
    let gradient = if delta.x != 0.0 { delta.y / delta.x } else { 0.0 };
    let y_at = |x: f64| s.y + gradient * (x - s.x);

    let mut emit = |main: i32, secondary: i32| {
        out.push(if steep {
            TileCoordinate::new(main, secondary)
        } else {
            TileCoordinate::new(secondary, main)
        });
    };

    let first = s.x.floor() as i32;
    let last = e.x.floor() as i32;
    for x in first..=last {
        let enter = y_at((x as f64).max(s.x)).floor() as i32;
        let leave = y_at(((x + 1) as f64).min(e.x)).floor() as i32;
        emit(x, enter);
        if leave != enter {
            emit(x, leave);
        }
    }
}

/// Append the 3x3 block of tiles centered on the tile containing `point`
pub fn list_neighbor_tiles(point: DVec2, out: &mut Vec<TileCoordinate>) {
    if !is_finite_point(point) {
        log::warn!("Non-finite point {point:?} rejected by neighbor scan");
        return;
    }
    if !within_grid(point) {
        log::warn!("Point {point:?} lies outside the tile grid, rejected by neighbor scan");
        return;
    }
    list_tile_neighbors(tile_of(point), out);
}

/// Append the 3x3 block of tiles centered on `tile` (including itself)
pub fn list_tile_neighbors(tile: TileCoordinate, out: &mut Vec<TileCoordinate>) {
    for dcol in -1..=1 {
        for drow in -1..=1 {
            out.push(tile.offset(drow, dcol));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tiles(start: DVec2, end: DVec2) -> Vec<TileCoordinate> {
        let mut out = Vec::new();
        list_intersecting_tiles(start, end, &mut out);
        out
    }

    #[test]
    fn test_tile_of_floors_negative() {
        assert_eq!(tile_of(DVec2::new(1.5, 2.5)), TileCoordinate::new(2, 1));
        assert_eq!(tile_of(DVec2::new(-0.5, -1.5)), TileCoordinate::new(-2, -1));
    }

    #[test]
    fn test_chunk_bounds_and_solidity() {
        let mut chunk = Chunk::new(0, 0);
        let c = TileCoordinate::new(3, 4);
        assert!(!chunk.is_solid(c));
        assert!(chunk.set_tile(c, Tile::solid(2)));
        assert!(chunk.is_solid(c));
        assert_eq!(chunk.tile(c).unwrap().sprite_index(), Some(1));

        assert!(!chunk.in_bounds(TileCoordinate::new(-1, 0)));
        assert!(!chunk.in_bounds(TileCoordinate::new(0, CHUNK_TILES)));
        assert!(!chunk.is_solid(TileCoordinate::new(40, 40)));
        assert!(!chunk.set_tile(TileCoordinate::new(32, 0), Tile::solid(1)));

        // Coordinates addressed to another chunk are out of range
        let other = TileCoordinate {
            chunk_row: 1,
            ..c
        };
        assert!(!chunk.in_bounds(other));
    }

    #[test]
    fn test_solid_tiles_row_major() {
        let mut chunk = Chunk::new(0, 0);
        chunk.set_tile(TileCoordinate::new(1, 0), Tile::solid(1));
        chunk.set_tile(TileCoordinate::new(0, 5), Tile::solid(1));
        let solid: Vec<_> = chunk.solid_tiles().map(|(c, _)| c).collect();
        assert_eq!(solid, vec![TileCoordinate::new(0, 5), TileCoordinate::new(1, 0)]);
    }

    #[test]
    fn test_horizontal_segment() {
        let out = tiles(DVec2::new(0.5, 0.5), DVec2::new(3.5, 0.5));
        assert_eq!(
            out,
            (0..=3).map(|c| TileCoordinate::new(0, c)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_steep_segment_walks_rows() {
        let out = tiles(DVec2::new(2.5, 0.5), DVec2::new(2.5, 4.5));
        assert_eq!(
            out,
            (0..=4).map(|r| TileCoordinate::new(r, 2)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_reversed_segment_same_cells() {
        let mut forward = tiles(DVec2::new(0.2, 0.3), DVec2::new(4.7, 2.1));
        let mut backward = tiles(DVec2::new(4.7, 2.1), DVec2::new(0.2, 0.3));
        forward.sort_by_key(|t| (t.row, t.col));
        backward.sort_by_key(|t| (t.row, t.col));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_single_point_segment() {
        let out = tiles(DVec2::new(5.5, 7.25), DVec2::new(5.5, 7.25));
        assert_eq!(out, vec![TileCoordinate::new(7, 5)]);
    }

    #[test]
    fn test_diagonal_includes_extra_tile() {
        // Solid tiles at (row 0, col 1) and (row 1, col 0) touch at corner (1, 1).
        // A diagonal sweep through that corner must see at least one of them.
        let out = tiles(DVec2::new(0.5, 0.5), DVec2::new(2.5, 2.5));
        assert!(
            out.contains(&TileCoordinate::new(1, 0)) || out.contains(&TileCoordinate::new(0, 1)),
            "diagonal gap tiles missing: {out:?}"
        );
    }

    #[test]
    fn test_shallow_crossing_emits_both_rows() {
        // y goes 0.9 -> 1.3 while x crosses a single column boundary
        let out = tiles(DVec2::new(0.1, 0.9), DVec2::new(1.9, 1.3));
        assert!(out.contains(&TileCoordinate::new(0, 0)));
        assert!(out.contains(&TileCoordinate::new(1, 0)) || out.contains(&TileCoordinate::new(1, 1)));
        assert!(out.contains(&TileCoordinate::new(1, 1)));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(tiles(DVec2::new(f64::NAN, 0.0), DVec2::new(1.0, 1.0)).is_empty());
        assert!(tiles(DVec2::new(0.0, 0.0), DVec2::new(f64::INFINITY, 1.0)).is_empty());
        assert!(tiles(DVec2::ZERO, DVec2::new(1e12, 0.0)).is_empty());

        let mut out = Vec::new();
        list_neighbor_tiles(DVec2::new(f64::NAN, 1.0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_far_coordinates_rejected() {
        let far = DVec2::new(1e300, 0.5);
        assert!(tiles(far, far).is_empty());
        assert!(tiles(DVec2::new(0.5, -1e10), DVec2::new(0.5, -1e10 + 2.0)).is_empty());

        let mut out = Vec::new();
        list_neighbor_tiles(far, &mut out);
        list_neighbor_tiles(DVec2::new(0.0, -1e300), &mut out);
        assert!(out.is_empty());

        // Largest accepted coordinate still rasterizes
        let edge = DVec2::new(MAX_TILE_COORDINATE - 0.5, 0.5);
        assert_eq!(tiles(edge, edge).len(), 1);
        list_neighbor_tiles(edge, &mut out);
        assert_eq!(out.len(), 9);
    }

    #[test]
    fn test_offset_saturates_at_grid_edge() {
        let corner = TileCoordinate::new(i32::MAX, i32::MIN);
        assert_eq!(corner.offset(1, -1), corner);
        let mut around = Vec::new();
        list_tile_neighbors(corner, &mut around);
        assert_eq!(around.len(), 9);
        assert_eq!(corner.manhattan(&TileCoordinate::new(i32::MIN, i32::MAX)), u32::MAX);
    }

    #[test]
    fn test_neighbor_blocks() {
        let mut out = Vec::new();
        list_neighbor_tiles(DVec2::new(5.2, 3.7), &mut out);
        assert_eq!(out.len(), 9);
        assert!(out.contains(&TileCoordinate::new(3, 5)));
        assert!(out.contains(&TileCoordinate::new(2, 4)));
        assert!(out.contains(&TileCoordinate::new(4, 6)));

        let mut around = Vec::new();
        list_tile_neighbors(TileCoordinate::new(0, 0), &mut around);
        assert_eq!(around.len(), 9);
        assert!(around.contains(&TileCoordinate::new(-1, -1)));
        assert!(around.iter().all(|t| t.manhattan(&TileCoordinate::new(0, 0)) <= 2));
    }

    /// Every tile the segment passes through (sampled densely) is listed
    fn covers_samples(start: DVec2, end: DVec2) -> bool {
        let out = tiles(start, end);
        (0..=200).all(|i| {
            let p = start.lerp(end, i as f64 / 200.0);
            // Skip samples sitting on a grid line, where rounding picks either side
            let near_line = |v: f64| (v - v.round()).abs() < 1e-6;
            if near_line(p.x) || near_line(p.y) {
                return true;
            }
            out.contains(&tile_of(p))
        })
    }

    proptest! {
        #[test]
        fn prop_rasterizer_covers_segment(
            sx in 0.0f64..30.0, sy in 0.0f64..30.0,
            ex in 0.0f64..30.0, ey in 0.0f64..30.0,
        ) {
            let start = DVec2::new(sx, sy);
            let end = DVec2::new(ex, ey);
            prop_assert!(covers_samples(start, end));
        }

        #[test]
        fn prop_short_far_segments_never_panic(
            sx in -1e300f64..1e300, sy in -1e300f64..1e300,
            dx in -3.0f64..3.0, dy in -3.0f64..3.0,
        ) {
            let start = DVec2::new(sx, sy);
            let mut out = Vec::new();
            list_intersecting_tiles(start, start + DVec2::new(dx, dy), &mut out);
            list_neighbor_tiles(start, &mut out);
            prop_assert!(out.len() <= 2 * 8 + 9);
        }

        #[test]
        fn prop_rasterizer_never_panics(
            sx in proptest::num::f64::ANY, sy in proptest::num::f64::ANY,
            ex in proptest::num::f64::ANY, ey in proptest::num::f64::ANY,
        ) {
            let mut out = Vec::new();
            list_intersecting_tiles(DVec2::new(sx, sy), DVec2::new(ex, ey), &mut out);
            prop_assert!(out.len() <= 2 * (MAX_RASTER_SPAN as usize + 2));
        }
    }
}
