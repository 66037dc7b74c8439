use std::num::NonZeroUsize;

use lru::LruCache;
use rayon::prelude::*;

use super::biome::BiomeId;
use super::modifications::{ChangesSince, ObjectModificationStore};
use super::position::ChunkKey;
use super::procgen::FeatureGenerator;
use crate::objects::WorldObject;

/// Filtered procedural objects per chunk, for renderers and debug views.
///
/// Entries are computed with [`FeatureGenerator::visible_objects`], the same
/// filter collision applies per tile. Before every read the cache replays the
/// modification store's change log, so a zone added or a feature deleted
/// after a chunk was cached is reflected on the next access. Entries remember
/// the biome they were generated for and are rebuilt when it changes.
pub struct FeatureCache {
    entries: LruCache<ChunkKey, (BiomeId, Vec<WorldObject>)>,
    synced_revision: u64,
    invalidations: u64,
}

impl FeatureCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            synced_revision: 0,
            invalidations: 0,
        }
    }

    /// Drop entries affected by modifications made since the last sync.
    pub fn sync(&mut self, mods: &ObjectModificationStore) {
        match mods.changes_since(self.synced_revision) {
            ChangesSince::UpToDate => {}
            ChangesSince::Scopes(scopes) => {
                let stale: Vec<ChunkKey> = self
                    .entries
                    .iter()
                    .map(|(key, _)| *key)
                    .filter(|key| scopes.iter().any(|s| s.affects(*key)))
                    .collect();
                for key in &stale {
                    self.entries.pop(key);
                }
                self.invalidations += stale.len() as u64;
                if !stale.is_empty() {
                    tracing::debug!("Invalidated {} cached feature chunks", stale.len());
                }
            }
            ChangesSince::Everything => {
                tracing::debug!("Feature cache fell behind, clearing {} chunks", self.entries.len());
                self.invalidations += self.entries.len() as u64;
                self.entries.clear();
            }
        }
        self.synced_revision = mods.revision();
    }

    /// Visible procedural objects of chunk `key`, generated on a miss.
    pub fn objects_in_chunk(
        &mut self,
        generator: &FeatureGenerator,
        mods: &ObjectModificationStore,
        key: ChunkKey,
        biome: BiomeId,
    ) -> &[WorldObject] {
        self.sync(mods);
        if self.entries.peek(&key).is_some_and(|(cached, _)| *cached != biome) {
            tracing::debug!("Chunk {} changed biome, regenerating features", key);
            self.invalidate_chunk(key);
        }
        &self
            .entries
            .get_or_insert_mut(key, || (biome, generator.visible_objects(key, biome, mods)))
            .1
    }

    /// Whether a cached procedural object of chunk `key` is solid at `(x, y)`.
    pub fn is_solid_tile(
        &mut self,
        generator: &FeatureGenerator,
        mods: &ObjectModificationStore,
        key: ChunkKey,
        biome: BiomeId,
        x: i32,
        y: i32,
    ) -> bool {
        self.objects_in_chunk(generator, mods, key, biome)
            .iter()
            .any(|o| o.is_solid_tile(x, y))
    }

    /// Generate every missing chunk in `chunks` on the rayon pool. Chunks
    /// beyond the capacity evict earlier ones as usual.
    pub fn warm(
        &mut self,
        generator: &FeatureGenerator,
        mods: &ObjectModificationStore,
        chunks: &[(ChunkKey, BiomeId)],
    ) {
        self.sync(mods);
        let missing: Vec<(ChunkKey, BiomeId)> = chunks
            .iter()
            .copied()
            .filter(|(key, biome)| !self.entries.peek(key).is_some_and(|(b, _)| b == biome))
            .collect();
        if missing.is_empty() {
            return;
        }
        let built: Vec<(ChunkKey, BiomeId, Vec<WorldObject>)> = missing
            .par_iter()
            .map(|(key, biome)| (*key, *biome, generator.visible_objects(*key, *biome, mods)))
            .collect();
        tracing::debug!("Warmed {} feature chunks", built.len());
        for (key, biome, objects) in built {
            self.entries.put(key, (biome, objects));
        }
    }

    /// Drop the entry for `key`, e.g. after its terrain was replaced.
    pub fn invalidate_chunk(&mut self, key: ChunkKey) {
        if self.entries.pop(&key).is_some() {
            self.invalidations += 1;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: ChunkKey) -> bool {
        self.entries.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries dropped because their chunk changed.
    pub fn invalidations(&self) -> u64 {
        self.invalidations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::biome::{BiomeDefinition, BiomeRegistry};
    use crate::world::modifications::{ExclusionZone, ProcObjectKey, ProcObjectKind};
    use crate::world::position::{TilePos, TileRect};
    use crate::world::tile::TileId;
    use std::sync::Arc;

    fn all_trees() -> FeatureGenerator {
        let reg = BiomeRegistry::from_definitions(vec![
            BiomeDefinition::new(BiomeId(1), "forest", TileId::GRASS).with_chances(0, 1024),
        ])
        .unwrap();
        FeatureGenerator::new(Arc::new(reg), 8)
    }

    const FOREST: BiomeId = BiomeId(1);

    #[test]
    fn late_zone_invalidates_cached_chunk() {
        let generator = all_trees();
        let mut mods = ObjectModificationStore::new(8);
        let mut cache = FeatureCache::new(16);
        let key = ChunkKey::new(0, 0, 0);

        assert!(cache.is_solid_tile(&generator, &mods, key, FOREST, 1, 1));
        mods.add_exclusion_zone(ExclusionZone::rectangular(TileRect::new(0, 0, 2, 2), 0.0));
        assert!(!cache.is_solid_tile(&generator, &mods, key, FOREST, 1, 1));
        assert_eq!(cache.invalidations(), 1);
    }

    #[test]
    fn unrelated_chunks_stay_cached() {
        let generator = all_trees();
        let mut mods = ObjectModificationStore::new(8);
        let mut cache = FeatureCache::new(16);
        let near = ChunkKey::new(0, 0, 0);
        let far = ChunkKey::new(0, 10, 10);
        cache.objects_in_chunk(&generator, &mods, near, FOREST);
        cache.objects_in_chunk(&generator, &mods, far, FOREST);

        mods.delete_object(ProcObjectKey::at(0, TilePos::new(3, 3), 8, ProcObjectKind::Tree));
        cache.sync(&mods);
        assert!(!cache.contains(near));
        assert!(cache.contains(far));
        assert_eq!(cache.objects_in_chunk(&generator, &mods, near, FOREST).len(), 63);
    }

    #[test]
    fn biome_change_regenerates_entry() {
        let generator = all_trees();
        let mods = ObjectModificationStore::new(8);
        let mut cache = FeatureCache::new(16);
        let key = ChunkKey::new(0, 0, 0);

        assert!(cache.is_solid_tile(&generator, &mods, key, FOREST, 3, 3));
        // Unknown ids fall back to the featureless None biome.
        assert!(!cache.is_solid_tile(&generator, &mods, key, BiomeId(9), 3, 3));
        assert!(cache.objects_in_chunk(&generator, &mods, key, BiomeId(9)).is_empty());
        assert_eq!(cache.invalidations(), 1);
    }

    #[test]
    fn warm_fills_missing_chunks() {
        let generator = all_trees();
        let mods = ObjectModificationStore::new(8);
        let mut cache = FeatureCache::new(16);
        let keys: Vec<_> = (0..4).map(|x| (ChunkKey::new(0, x, -1), FOREST)).collect();
        cache.warm(&generator, &mods, &keys);
        assert_eq!(cache.len(), 4);
        assert!(keys.iter().all(|(k, _)| cache.contains(*k)));
    }

    #[test]
    fn capacity_bounds_entries() {
        let generator = all_trees();
        let mods = ObjectModificationStore::new(8);
        let mut cache = FeatureCache::new(2);
        for x in 0..5 {
            cache.objects_in_chunk(&generator, &mods, ChunkKey::new(0, x, 0), FOREST);
        }
        assert_eq!(cache.len(), 2);
    }
}
