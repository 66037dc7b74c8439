use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::ObjectId;
use super::draw::{DrawTarget, PixelRect, Rgba};
use crate::world::position::TileRect;

const WALL: Rgba = Rgba::rgb(139, 69, 19);
const FLOOR: Rgba = Rgba::rgb(222, 184, 135);
const FLOOR_SHADE: f32 = 0.8;

/// A walled rectangle with a gap in its border for the door.
///
/// Only border tiles are solid. The door is a horizontal run of `door_width`
/// tiles starting at `door` (local coordinates); door tiles that do not lie
/// on the border have no effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: ObjectId,
    pub layer: i32,
    pub bounds: TileRect,
    pub door: IVec2,
    pub door_width: i32,
}

impl House {
    /// A 6x6 house at `(x, y)` with a one-tile door centred in the bottom wall.
    pub fn new(id: ObjectId, layer: i32, x: i32, y: i32) -> Self {
        Self::with_size(id, layer, TileRect::new(x, y, 6, 6))
    }

    /// A house covering `bounds` with the default door.
    pub fn with_size(id: ObjectId, layer: i32, bounds: TileRect) -> Self {
        Self {
            id,
            layer,
            bounds,
            door: IVec2::new(bounds.w / 2, bounds.h - 1),
            door_width: 1,
        }
    }

    pub fn with_door(mut self, door: IVec2, width: i32) -> Self {
        self.door = door;
        self.door_width = width;
        self
    }

    fn is_border(&self, lx: i32, ly: i32) -> bool {
        lx == 0 || ly == 0 || lx == self.bounds.w - 1 || ly == self.bounds.h - 1
    }

    fn is_door(&self, lx: i32, ly: i32) -> bool {
        ly == self.door.y
            && lx >= self.door.x
            && lx < self.door.x.saturating_add(self.door_width)
            && self.is_border(lx, ly)
    }

    pub fn is_solid_tile(&self, x: i32, y: i32) -> bool {
        if !self.bounds.contains(x, y) {
            return false;
        }
        let (lx, ly) = (x - self.bounds.x, y - self.bounds.y);
        self.is_border(lx, ly) && !self.is_door(lx, ly)
    }

    /// Floor first, then one wall rectangle per solid border tile.
    pub fn draw(&self, target: &mut dyn DrawTarget, tile_px: i32) {
        let b = self.bounds;
        target.fill_rect(
            PixelRect::new(b.x * tile_px, b.y * tile_px, b.w * tile_px, b.h * tile_px),
            FLOOR.scaled(FLOOR_SHADE),
        );
        for ly in 0..b.h {
            for lx in 0..b.w {
                if !self.is_border(lx, ly) || self.is_door(lx, ly) {
                    continue;
                }
                target.fill_rect(
                    PixelRect::new((b.x + lx) * tile_px, (b.y + ly) * tile_px, tile_px, tile_px),
                    WALL,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_door_is_bottom_centre() {
        let house = House::new(ObjectId(1), 0, 0, 0);
        assert_eq!(house.door, IVec2::new(3, 5));
        assert!(!house.is_solid_tile(3, 5));
        assert!(house.is_solid_tile(2, 5));
        assert!(house.is_solid_tile(4, 5));
        assert!(!house.is_solid_tile(2, 2));
    }

    #[test]
    fn interior_door_is_ignored() {
        let house = House::new(ObjectId(1), 0, 0, 0).with_door(IVec2::new(2, 2), 2);
        assert!(!house.is_solid_tile(2, 2));
        assert!(house.is_solid_tile(3, 5));
    }

    #[test]
    fn wide_door_opens_a_run() {
        let house = House::new(ObjectId(1), 0, 10, 10).with_door(IVec2::new(1, 0), 3);
        let open: Vec<i32> = (10..16).filter(|x| !house.is_solid_tile(*x, 10)).collect();
        assert_eq!(open, vec![11, 12, 13]);
    }

    #[test]
    fn draw_emits_floor_and_walls() {
        let house = House::new(ObjectId(1), 0, 0, 0);
        let mut out: Vec<(PixelRect, Rgba)> = Vec::new();
        house.draw(&mut out, 16);
        assert_eq!(out[0].0, PixelRect::new(0, 0, 96, 96));
        assert_eq!(out[0].1, Rgba::rgba(178, 147, 108, 204));
        // 20 border tiles minus the door.
        assert_eq!(out.len(), 1 + 19);
        assert!(out[1..].iter().all(|(_, c)| *c == WALL));
    }
}
