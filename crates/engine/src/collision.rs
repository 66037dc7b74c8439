use glam::Vec2;

use crate::objects::WorldObjectStore;
use crate::world::chunk_manager::ChunkManager;
use crate::world::modifications::ObjectModificationStore;
use crate::world::position::TilePos;
use crate::world::procgen::FeatureGenerator;

/// Moves a circular entity through the world without entering solid tiles.
///
/// A tile is solid if a visible procedural feature grows on it or if an
/// explicit object reports it solid. The resolver borrows every store for the
/// duration of one query batch; it keeps no state of its own.
pub struct CollisionResolver<'w> {
    chunks: &'w mut ChunkManager,
    features: &'w FeatureGenerator,
    objects: &'w WorldObjectStore,
    mods: &'w ObjectModificationStore,
    radius: f32,
}

impl<'w> CollisionResolver<'w> {
    pub fn new(
        chunks: &'w mut ChunkManager,
        features: &'w FeatureGenerator,
        objects: &'w WorldObjectStore,
        mods: &'w ObjectModificationStore,
        radius: f32,
    ) -> Self {
        Self {
            chunks,
            features,
            objects,
            mods,
            radius,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Where an entity at `current` ends up when it tries to reach `desired`.
    ///
    /// Tries the full move, then the X component alone, then the Y component
    /// alone, and otherwise stays put. Blocked diagonal moves slide along
    /// walls instead of stopping dead.
    pub fn resolve_movement(&mut self, current: Vec2, desired: Vec2) -> Vec2 {
        let candidates = [
            desired,
            Vec2::new(desired.x, current.y),
            Vec2::new(current.x, desired.y),
        ];
        candidates
            .into_iter()
            .find(|pos| !self.is_solid_at(*pos))
            .unwrap_or(current)
    }

    /// Whether a circle of the configured radius at `pos` overlaps a solid
    /// tile.
    pub fn is_solid_at(&mut self, pos: Vec2) -> bool {
        let r = self.radius;
        let lo = TilePos::containing(pos - r);
        let hi = TilePos::containing(pos + r);
        for ty in lo.y..=hi.y {
            for tx in lo.x..=hi.x {
                if circle_overlaps_tile(pos, r, tx, ty) && self.is_tile_solid(tx, ty) {
                    return true;
                }
            }
        }
        false
    }

    /// The authoritative per-tile solidity check.
    pub fn is_tile_solid(&mut self, x: i32, y: i32) -> bool {
        let layer = self.chunks.layer();
        let chunk = self.chunks.chunk_for_tile(TilePos::new(x, y));
        self.features
            .visible_feature_at(chunk, self.mods, x, y)
            .is_some()
            || self.objects.is_solid_tile(layer, x, y)
    }
}

/// Circle against the unit square of tile `(tx, ty)`. Touching is not
/// overlapping.
fn circle_overlaps_tile(center: Vec2, radius: f32, tx: i32, ty: i32) -> bool {
    let min = Vec2::new(tx as f32, ty as f32);
    let closest = center.clamp(min, min + Vec2::ONE);
    center.distance_squared(closest) < radius * radius
}
