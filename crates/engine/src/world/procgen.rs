//! Deterministic trees and boulders.
//!
//! Whether a tile hosts a feature is a pure function of its world coordinates,
//! its chunk's biome and a per-feature salt. Nothing here is stored: the same
//! inputs always regenerate the same objects, so callers may cache the output
//! and throw it away at will.

use std::sync::Arc;

use super::biome::{BiomeId, BiomeRegistry, CHANCE_SCALE};
use super::chunk::Chunk;
use super::hash::hash32;
use super::modifications::{ObjectModificationStore, ProcObjectKey};
use super::position::{ChunkKey, TilePos};
use crate::objects::{Rock, RockType, Tree, TreeType, WorldObject};

pub const BOULDER_SALT: i32 = 424_242;
pub const TREE_SALT: i32 = 515_151;
/// Added to a feature salt once per biome id so biomes do not share layouts.
const BIOME_SALT_STRIDE: i32 = 1000;
/// Bits below this shift decide presence; the rest pick the variant.
const VARIANT_SHIFT: u32 = 10;

#[derive(Debug, Clone)]
pub struct FeatureGenerator {
    biomes: Arc<BiomeRegistry>,
    chunk_size: i32,
}

impl FeatureGenerator {
    pub fn new(biomes: Arc<BiomeRegistry>, chunk_size: i32) -> Self {
        Self { biomes, chunk_size }
    }

    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    pub fn has_boulder(&self, chunk: &Chunk, wx: i32, wy: i32) -> bool {
        self.boulder_hash(chunk.biome(), wx, wy).is_some()
    }

    pub fn has_tree(&self, chunk: &Chunk, wx: i32, wy: i32) -> bool {
        self.tree_hash(chunk.biome(), wx, wy).is_some()
    }

    /// Boulder or tree, before any exclusion or deletion filtering.
    pub fn has_solid_feature(&self, chunk: &Chunk, wx: i32, wy: i32) -> bool {
        self.has_boulder(chunk, wx, wy) || self.has_tree(chunk, wx, wy)
    }

    /// The object that grows on world tile `(wx, wy)`, if any. A tree wins
    /// over a boulder on the same tile.
    pub fn feature_at(&self, chunk: &Chunk, wx: i32, wy: i32) -> Option<WorldObject> {
        self.feature_for(chunk.key().layer, chunk.biome(), wx, wy)
    }

    fn feature_for(&self, layer: i32, biome: BiomeId, wx: i32, wy: i32) -> Option<WorldObject> {
        let tile = TilePos::new(wx, wy);
        if let Some(h) = self.tree_hash(biome, wx, wy) {
            let variant = TreeType::ALL[(h >> VARIANT_SHIFT) as usize % TreeType::ALL.len()];
            return Some(Tree::procedural(layer, tile, variant).into());
        }
        self.boulder_hash(biome, wx, wy).map(|h| {
            let variant = RockType::ALL[(h >> VARIANT_SHIFT) as usize % RockType::ALL.len()];
            Rock::procedural(layer, tile, variant).into()
        })
    }

    /// Every feature of chunk `(cx, cy)`, unfiltered, in row-major tile
    /// order. Pure: repeated calls return equal vectors.
    pub fn generate_chunk_objects(&self, chunk: &Chunk, cx: i32, cy: i32) -> Vec<WorldObject> {
        self.generate_for(ChunkKey::new(chunk.key().layer, cx, cy), chunk.biome())
    }

    /// [`FeatureGenerator::generate_chunk_objects`] from a key and biome
    /// alone, so it can run without access to the chunk itself.
    pub fn generate_for(&self, key: ChunkKey, biome: BiomeId) -> Vec<WorldObject> {
        let origin = key.origin(self.chunk_size);
        let mut objects = Vec::new();
        for ly in 0..self.chunk_size {
            for lx in 0..self.chunk_size {
                let (wx, wy) = (origin.x.wrapping_add(lx), origin.y.wrapping_add(ly));
                if let Some(obj) = self.feature_for(key.layer, biome, wx, wy) {
                    objects.push(obj);
                }
            }
        }
        objects
    }

    /// Whether a procedural object survives exclusion zones and deletions.
    ///
    /// This is the single filter shared by collision and by every cached
    /// view of procedural objects. Explicit objects always pass.
    pub fn is_visible(&self, object: &WorldObject, mods: &ObjectModificationStore) -> bool {
        let Some(kind) = object.proc_kind().filter(|_| object.is_procedural()) else {
            return true;
        };
        let position = object.position();
        if mods.is_in_exclusion_zone(position) {
            return false;
        }
        let key = ProcObjectKey::at(object.layer(), TilePos::containing(position), self.chunk_size, kind);
        !mods.is_deleted(&key)
    }

    /// The feature on `(wx, wy)` after filtering.
    pub fn visible_feature_at(
        &self,
        chunk: &Chunk,
        mods: &ObjectModificationStore,
        wx: i32,
        wy: i32,
    ) -> Option<WorldObject> {
        self.feature_at(chunk, wx, wy)
            .filter(|obj| self.is_visible(obj, mods))
    }

    /// Filtered features of one chunk.
    pub fn visible_objects(
        &self,
        key: ChunkKey,
        biome: BiomeId,
        mods: &ObjectModificationStore,
    ) -> Vec<WorldObject> {
        let mut objects = self.generate_for(key, biome);
        objects.retain(|obj| self.is_visible(obj, mods));
        objects
    }

    fn boulder_hash(&self, biome: BiomeId, wx: i32, wy: i32) -> Option<u32> {
        let chance = self.biomes.get(biome).boulder_chance;
        roll(chance, biome, wx, wy, BOULDER_SALT)
    }

    fn tree_hash(&self, biome: BiomeId, wx: i32, wy: i32) -> Option<u32> {
        let chance = self.biomes.get(biome).tree_chance;
        roll(chance, biome, wx, wy, TREE_SALT)
    }
}

/// `Some(hash)` if the tile passes a `chance`-out-of-1024 roll.
fn roll(chance: u16, biome: BiomeId, wx: i32, wy: i32, salt: i32) -> Option<u32> {
    if chance == 0 {
        return None;
    }
    let salt = salt.wrapping_add((biome.0 as i32).wrapping_mul(BIOME_SALT_STRIDE));
    let h = hash32(wx, wy, salt);
    (chance >= CHANCE_SCALE || (h & (CHANCE_SCALE as u32 - 1)) < chance as u32).then_some(h)
}
