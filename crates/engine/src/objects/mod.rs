//! Things that stand on the terrain.
//!
//! [`WorldObject`] is a closed set: the store, the collision resolver and the
//! renderer all match on it exhaustively. Adding a kind of object means adding
//! a variant here.

pub mod decor;
pub mod draw;
pub mod house;
pub mod store;

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use decor::{Rock, RockType, Tree, TreeType};
pub use draw::{DrawTarget, PixelRect, Rgba};
pub use house::House;
pub use store::WorldObjectStore;

use crate::world::modifications::ProcObjectKind;
use crate::world::position::TileRect;

/// Identity of an explicitly stored object. Procedural objects all share
/// [`ObjectId::PROCEDURAL`] and are identified by their
/// [`ProcObjectKey`](crate::world::modifications::ProcObjectKey) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    pub const PROCEDURAL: ObjectId = ObjectId(0);
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How an object is indexed: point to large objects are bucketed per chunk,
/// massive ones are kept in a flat list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeCategory {
    /// One tile (trees, rocks).
    Point,
    /// 2 to 4 tiles.
    Small,
    /// 5 to 16 tiles.
    Medium,
    /// 17 tiles and up, e.g. houses.
    Large,
    /// Spans many chunks.
    Massive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldObject {
    House(House),
    Tree(Tree),
    Rock(Rock),
}

impl WorldObject {
    pub fn id(&self) -> ObjectId {
        match self {
            Self::House(h) => h.id,
            Self::Tree(t) => t.id,
            Self::Rock(r) => r.id,
        }
    }

    pub fn layer(&self) -> i32 {
        match self {
            Self::House(h) => h.layer,
            Self::Tree(t) => t.layer,
            Self::Rock(r) => r.layer,
        }
    }

    pub fn bounds(&self) -> TileRect {
        match self {
            Self::House(h) => h.bounds,
            Self::Tree(t) => TileRect::tile(t.tile),
            Self::Rock(r) => TileRect::tile(r.tile),
        }
    }

    /// Top-left corner in tile units.
    pub fn position(&self) -> Vec2 {
        let b = self.bounds();
        Vec2::new(b.x as f32, b.y as f32)
    }

    pub fn size_category(&self) -> SizeCategory {
        match self {
            Self::House(_) => SizeCategory::Large,
            Self::Tree(_) | Self::Rock(_) => SizeCategory::Point,
        }
    }

    pub fn is_solid_tile(&self, x: i32, y: i32) -> bool {
        match self {
            Self::House(h) => h.is_solid_tile(x, y),
            Self::Tree(Tree { tile, .. }) | Self::Rock(Rock { tile, .. }) => {
                tile.x == x && tile.y == y
            }
        }
    }

    pub fn draw(&self, target: &mut dyn DrawTarget, tile_px: i32) {
        match self {
            Self::House(h) => h.draw(target, tile_px),
            Self::Tree(t) => t.draw(target, tile_px),
            Self::Rock(r) => r.draw(target, tile_px),
        }
    }

    /// The procedural kind this object could have been generated as.
    pub fn proc_kind(&self) -> Option<ProcObjectKind> {
        match self {
            Self::House(_) => None,
            Self::Tree(_) => Some(ProcObjectKind::Tree),
            Self::Rock(_) => Some(ProcObjectKind::Rock),
        }
    }

    pub fn is_procedural(&self) -> bool {
        self.id() == ObjectId::PROCEDURAL
    }
}

impl From<House> for WorldObject {
    fn from(h: House) -> Self {
        Self::House(h)
    }
}

impl From<Tree> for WorldObject {
    fn from(t: Tree) -> Self {
        Self::Tree(t)
    }
}

impl From<Rock> for WorldObject {
    fn from(r: Rock) -> Self {
        Self::Rock(r)
    }
}
