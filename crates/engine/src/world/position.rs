use std::fmt;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Absolute tile position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile containing a continuous position (floor, not truncation).
    pub fn containing(pos: Vec2) -> Self {
        Self::new(pos.x.floor() as i32, pos.y.floor() as i32)
    }

    /// Chunk coordinates of the chunk holding this tile.
    ///
    /// Uses floor division so `-1` lands in chunk `-1`, not chunk `0`.
    pub const fn chunk(&self, chunk_size: i32) -> (i32, i32) {
        (self.x.div_euclid(chunk_size), self.y.div_euclid(chunk_size))
    }

    /// Position within the chunk (`0..chunk_size` on each axis).
    pub const fn local(&self, chunk_size: i32) -> LocalTilePos {
        LocalTilePos {
            x: self.x.rem_euclid(chunk_size) as u16,
            y: self.y.rem_euclid(chunk_size) as u16,
        }
    }

    /// Top-left corner of the tile as a continuous position.
    pub fn corner(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    pub fn as_ivec2(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }
}

impl From<IVec2> for TilePos {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Tile position local to a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalTilePos {
    pub x: u16,
    pub y: u16,
}

impl LocalTilePos {
    /// Row-major index into a chunk's terrain array.
    pub const fn index(&self, chunk_size: i32) -> usize {
        self.y as usize * chunk_size as usize + self.x as usize
    }
}

/// Addresses one chunk within one logical layer (ground, structures, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkKey {
    pub layer: i32,
    pub x: i32,
    pub y: i32,
}

impl ChunkKey {
    pub const fn new(layer: i32, x: i32, y: i32) -> Self {
        Self { layer, x, y }
    }

    /// The chunk holding `tile` on `layer`.
    pub const fn containing(layer: i32, tile: TilePos, chunk_size: i32) -> Self {
        let (x, y) = tile.chunk(chunk_size);
        Self { layer, x, y }
    }

    /// World tile at local `(0, 0)` of this chunk.
    pub const fn origin(&self, chunk_size: i32) -> TilePos {
        TilePos::new(
            self.x.wrapping_mul(chunk_size),
            self.y.wrapping_mul(chunk_size),
        )
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{} ({},{})", self.layer, self.x, self.y)
    }
}

/// Inclusive rectangle of chunk coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl ChunkRange {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Chunks touched by the continuous box `[min, max]` in tile units.
    pub fn covering(min: Vec2, max: Vec2, chunk_size: i32) -> Self {
        let lo = TilePos::containing(min);
        let hi = TilePos::containing(max);
        let (min_x, min_y) = lo.chunk(chunk_size);
        let (max_x, max_y) = hi.chunk(chunk_size);
        Self { min_x, min_y, max_x, max_y }
    }

    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Row-major iteration over every chunk coordinate in the range.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + use<> {
        let Self { min_x, min_y, max_x, max_y } = *self;
        (min_y..=max_y).flat_map(move |y| (min_x..=max_x).map(move |x| (x, y)))
    }
}

/// Axis-aligned rectangle in tile units (`x, y` is the top-left tile).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl TileRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Single-tile rectangle.
    pub const fn tile(pos: TilePos) -> Self {
        Self::new(pos.x, pos.y, 1, 1)
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    /// Whether both exclusive edges are representable tile coordinates.
    pub const fn fits(&self) -> bool {
        self.x.checked_add(self.w).is_some() && self.y.checked_add(self.h).is_some()
    }

    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub const fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Chunks overlapped by this rectangle, or `None` for an empty rectangle.
    pub const fn chunk_range(&self, chunk_size: i32) -> Option<ChunkRange> {
        if self.is_empty() {
            return None;
        }
        let (min_x, min_y) = TilePos::new(self.x, self.y).chunk(chunk_size);
        let (max_x, max_y) = TilePos::new(self.right() - 1, self.bottom() - 1).chunk(chunk_size);
        Some(ChunkRange { min_x, min_y, max_x, max_y })
    }
}
