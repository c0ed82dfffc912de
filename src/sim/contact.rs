//! Persistent tile contacts
//!
//! A contact remembers that an entity rests against a tile face. Each tick the
//! ledger re-checks every contact, re-anchors it to a flush neighbor when the
//! entity has slid past the original tile, and drops the rest. Surviving
//! contacts then strip velocity that would push into their surfaces.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::collision::{Collision, ContactSide, constrained_surface_vel};
use super::grid::{Chunk, TileCoordinate, list_tile_neighbors};
use crate::consts::{CONTACT_BUFFER, TILE_WIDTH};

/// A shape's claim that it touches one face of a solid tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub position: DVec2,
    pub normal: DVec2,
    pub tile: TileCoordinate,
    /// Fixed at creation; re-anchoring never changes it
    pub side: ContactSide,
    pub valid: bool,
}

impl Contact {
    pub fn from_collision(collision: &Collision, tile: TileCoordinate) -> Self {
        Self {
            position: collision.position,
            normal: collision.normal,
            tile,
            side: collision.side,
            valid: true,
        }
    }
}

/// True if a box at `pos` with extent `dim` lies within the contact buffer of `tile`
fn within_buffer(pos: DVec2, dim: DVec2, tile: TileCoordinate) -> bool {
    let lo = tile.origin() - dim - DVec2::splat(CONTACT_BUFFER);
    let hi = tile.origin() + DVec2::splat(TILE_WIDTH + CONTACT_BUFFER);
    pos.x >= lo.x && pos.x <= hi.x && pos.y >= lo.y && pos.y <= hi.y
}

/// Whether the contact's own tile still holds the shape
pub fn still_in_contact(chunk: &Chunk, pos: DVec2, dim: DVec2, contact: &Contact) -> bool {
    contact.valid && chunk.is_solid(contact.tile) && within_buffer(pos, dim, contact.tile)
}

/// Whether `candidate` can take over `contact` without rotating its face.
///
/// The candidate must sit one step along the contact surface: a row offset
/// for wall contacts, a column offset for floor and ceiling contacts.
pub fn maintained_by(chunk: &Chunk, pos: DVec2, dim: DVec2, contact: &Contact, candidate: TileCoordinate) -> bool {
    let drow = (candidate.row - contact.tile.row).abs();
    let dcol = (candidate.col - contact.tile.col).abs();
    if drow + dcol != 1 {
        return false;
    }
    let flush = if contact.side.is_wall() { drow == 1 } else { dcol == 1 };
    flush && contact.valid && chunk.is_solid(candidate) && within_buffer(pos, dim, candidate)
}

/// Per-entity list of live contacts, in creation order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactLedger {
    contacts: Vec<Contact>,
}

impl ContactLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }

    pub fn push(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }

    /// True if some contact is anchored on `tile`
    pub fn holds(&self, tile: TileCoordinate) -> bool {
        self.contacts.iter().any(|c| c.tile == tile)
    }

    /// Re-derive every contact against the current terrain and shape position.
    ///
    /// Returns the number of contacts dropped.
    pub fn revalidate(&mut self, chunk: &Chunk, pos: DVec2, dim: DVec2) -> usize {
        let before = self.contacts.len();
        let mut neighbors = Vec::with_capacity(9);
        self.contacts.retain_mut(|contact| {
            if still_in_contact(chunk, pos, dim, contact) {
                return true;
            }
            neighbors.clear();
            list_tile_neighbors(contact.tile, &mut neighbors);
            match neighbors
                .iter()
                .copied()
                .find(|&b| maintained_by(chunk, pos, dim, contact, b))
            {
                Some(replacement) => {
                    contact.tile = replacement;
                    true
                }
                None => false,
            }
        });
        before - self.contacts.len()
    }

    /// Remove velocity heading into any contact surface
    pub fn constrain_velocity(&self, vel: DVec2) -> DVec2 {
        self.contacts
            .iter()
            .fold(vel, |v, c| constrained_surface_vel(v, c.normal))
    }

    /// Which faces are currently touched, indexed by `ContactSide::index`
    pub fn sides(&self) -> [bool; 4] {
        let mut sides = [false; 4];
        for c in &self.contacts {
            sides[c.side.index()] = true;
        }
        sides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::Tile;

    const DIM: DVec2 = DVec2::new(0.5, 0.5);

    fn floor_contact(tile: TileCoordinate) -> Contact {
        Contact {
            position: DVec2::ZERO,
            normal: DVec2::Y,
            tile,
            side: ContactSide::Top,
            valid: true,
        }
    }

    fn wall_contact(tile: TileCoordinate) -> Contact {
        Contact {
            position: DVec2::ZERO,
            normal: DVec2::NEG_X,
            tile,
            side: ContactSide::Left,
            valid: true,
        }
    }

    fn floor_chunk() -> Chunk {
        let mut chunk = Chunk::new(0, 0);
        chunk.fill(0..=0, 0..=31, Tile::solid(1));
        chunk
    }

    #[test]
    fn test_resting_contact_kept() {
        let chunk = floor_chunk();
        let mut ledger = ContactLedger::new();
        ledger.push(floor_contact(TileCoordinate::new(0, 2)));
        let dropped = ledger.revalidate(&chunk, DVec2::new(2.2, 1.01), DIM);
        assert_eq!(dropped, 0);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.iter().next().unwrap().tile, TileCoordinate::new(0, 2));
    }

    #[test]
    fn test_sliding_reanchors_along_floor() {
        let chunk = floor_chunk();
        let mut ledger = ContactLedger::new();
        ledger.push(floor_contact(TileCoordinate::new(0, 2)));
        // Slid fully onto the next tile to the right
        ledger.revalidate(&chunk, DVec2::new(3.3, 1.01), DIM);
        let c = ledger.iter().next().unwrap();
        assert_eq!(c.tile, TileCoordinate::new(0, 3));
        assert_eq!(c.side, ContactSide::Top);
    }

    #[test]
    fn test_lifting_off_drops_contact() {
        let chunk = floor_chunk();
        let mut ledger = ContactLedger::new();
        ledger.push(floor_contact(TileCoordinate::new(0, 2)));
        assert_eq!(ledger.revalidate(&chunk, DVec2::new(2.2, 1.2), DIM), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_removed_tile_drops_contact() {
        let mut chunk = floor_chunk();
        let mut ledger = ContactLedger::new();
        ledger.push(floor_contact(TileCoordinate::new(0, 2)));
        chunk.set_tile(TileCoordinate::new(0, 2), Tile::EMPTY);
        chunk.set_tile(TileCoordinate::new(0, 1), Tile::EMPTY);
        chunk.set_tile(TileCoordinate::new(0, 3), Tile::EMPTY);
        ledger.revalidate(&chunk, DVec2::new(2.2, 1.01), DIM);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_floor_contact_never_rotates_to_wall() {
        // Only a diagonal and a vertical neighbor remain solid
        let mut chunk = Chunk::new(0, 0);
        chunk.set_tile(TileCoordinate::new(1, 3), Tile::solid(1));
        chunk.set_tile(TileCoordinate::new(1, 2), Tile::solid(1));
        let contact = floor_contact(TileCoordinate::new(0, 2));
        let pos = DVec2::new(2.6, 1.01);
        assert!(!maintained_by(&chunk, pos, DIM, &contact, TileCoordinate::new(1, 3)));
        assert!(!maintained_by(&chunk, pos, DIM, &contact, TileCoordinate::new(1, 2)));

        let mut ledger = ContactLedger::new();
        ledger.push(contact);
        ledger.revalidate(&chunk, pos, DIM);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_wall_contact_reanchors_by_row() {
        let mut chunk = Chunk::new(0, 0);
        chunk.fill(0..=5, 4..=4, Tile::solid(1));
        let contact = wall_contact(TileCoordinate::new(2, 4));
        let pos = DVec2::new(3.49, 3.2);
        assert!(maintained_by(&chunk, pos, DIM, &contact, TileCoordinate::new(3, 4)));
        assert!(!maintained_by(&chunk, pos, DIM, &contact, TileCoordinate::new(2, 5)));

        let mut ledger = ContactLedger::new();
        ledger.push(contact);
        ledger.revalidate(&chunk, pos, DIM);
        let c = ledger.iter().next().unwrap();
        assert_eq!(c.tile, TileCoordinate::new(3, 4));
        assert_eq!(c.side, ContactSide::Left);
    }

    #[test]
    fn test_survivors_keep_order() {
        let chunk = floor_chunk();
        let mut ledger = ContactLedger::new();
        ledger.push(floor_contact(TileCoordinate::new(0, 2)));
        ledger.push(wall_contact(TileCoordinate::new(5, 9)));
        ledger.push(floor_contact(TileCoordinate::new(0, 3)));
        ledger.revalidate(&chunk, DVec2::new(2.7, 1.01), DIM);
        let tiles: Vec<_> = ledger.iter().map(|c| c.tile).collect();
        assert_eq!(tiles, vec![TileCoordinate::new(0, 2), TileCoordinate::new(0, 3)]);
    }

    #[test]
    fn test_constrain_velocity_and_sides() {
        let mut ledger = ContactLedger::new();
        ledger.push(floor_contact(TileCoordinate::new(0, 2)));
        ledger.push(wall_contact(TileCoordinate::new(1, 4)));
        let v = ledger.constrain_velocity(DVec2::new(0.3, -0.4));
        assert_eq!(v, DVec2::new(0.0, 0.0));
        let v = ledger.constrain_velocity(DVec2::new(-0.3, 0.4));
        assert_eq!(v, DVec2::new(-0.3, 0.4));

        let sides = ledger.sides();
        assert!(sides[ContactSide::Top.index()]);
        assert!(sides[ContactSide::Left.index()]);
        assert!(!sides[ContactSide::Right.index()]);
        assert!(ledger.holds(TileCoordinate::new(1, 4)));
    }
}
