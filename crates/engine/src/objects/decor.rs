use serde::{Deserialize, Serialize};

use super::ObjectId;
use super::draw::{DrawTarget, PixelRect, Rgba};
use crate::world::position::TilePos;

const TRUNK: Rgba = Rgba::rgb(101, 67, 33);
const ROCK_SHADOW: Rgba = Rgba::rgba(0, 0, 0, 100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeType {
    Oak,
    Pine,
    Birch,
}

impl TreeType {
    pub const ALL: [TreeType; 3] = [TreeType::Oak, TreeType::Pine, TreeType::Birch];

    fn canopy(self) -> Rgba {
        match self {
            TreeType::Oak => Rgba::rgb(34, 139, 34),
            TreeType::Pine => Rgba::rgb(0, 100, 0),
            TreeType::Birch => Rgba::rgb(60, 179, 113),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RockType {
    Small,
    Medium,
    Large,
}

impl RockType {
    pub const ALL: [RockType; 3] = [RockType::Small, RockType::Medium, RockType::Large];

    fn color(self) -> Rgba {
        match self {
            RockType::Small => Rgba::rgb(128, 128, 128),
            RockType::Medium => Rgba::rgb(105, 105, 105),
            RockType::Large => Rgba::rgb(112, 128, 144),
        }
    }

    fn size_px(self, tile_px: i32) -> i32 {
        match self {
            RockType::Small => tile_px / 2,
            RockType::Medium => tile_px * 3 / 4,
            RockType::Large => tile_px,
        }
    }
}

/// A single-tile tree. Procedural trees carry [`ObjectId::PROCEDURAL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tree {
    pub id: ObjectId,
    pub layer: i32,
    pub tile: TilePos,
    pub variant: TreeType,
}

impl Tree {
    pub fn procedural(layer: i32, tile: TilePos, variant: TreeType) -> Self {
        Self {
            id: ObjectId::PROCEDURAL,
            layer,
            tile,
            variant,
        }
    }

    pub fn draw(&self, target: &mut dyn DrawTarget, tile_px: i32) {
        let (px, py) = (self.tile.x * tile_px, self.tile.y * tile_px);
        target.fill_rect(
            PixelRect::new(px + tile_px / 3, py + tile_px / 2, tile_px / 3, tile_px / 2),
            TRUNK,
        );
        target.fill_rect(
            PixelRect::new(px, py, tile_px, tile_px / 2 + tile_px / 4),
            self.variant.canopy(),
        );
    }
}

/// A single-tile rock (procedural boulders are rocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rock {
    pub id: ObjectId,
    pub layer: i32,
    pub tile: TilePos,
    pub variant: RockType,
}

impl Rock {
    pub fn procedural(layer: i32, tile: TilePos, variant: RockType) -> Self {
        Self {
            id: ObjectId::PROCEDURAL,
            layer,
            tile,
            variant,
        }
    }

    /// Centred square sized by variant, with a thin shadow along its base.
    pub fn draw(&self, target: &mut dyn DrawTarget, tile_px: i32) {
        let size = self.variant.size_px(tile_px);
        let offset = (tile_px - size) / 2;
        let (x, y) = (self.tile.x * tile_px + offset, self.tile.y * tile_px + offset);
        target.fill_rect(PixelRect::new(x, y, size, size), self.variant.color());
        target.fill_rect(PixelRect::new(x + 1, y + size - 2, size - 1, 2), ROCK_SHADOW);
    }
}
