use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::biome::{BiomeId, BiomeRegistry};
use super::chunk::Chunk;
use super::hash::hash32;
use super::position::{ChunkKey, TilePos};
use super::tile::TileId;
use crate::error::WorldError;

/// Multiplier mixing the layer id into the biome salt so layers get
/// independent biome layouts.
const BIOME_LAYER_PRIME: i32 = 1_000_003;

/// Counters for cache behaviour, readable at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Misses answered from retained (edited) terrain instead of the seed.
    pub restored: u64,
}

/// Owns the resident chunks of one layer and creates them on demand.
///
/// Resident chunks live in an access-ordered LRU bounded by the configured
/// capacity. Chunks are pure functions of `(seed, layer, x, y)`, so evicting
/// one loses nothing but its render cache. The exception is a chunk whose
/// terrain was edited after generation: its tiles move to a side table on
/// eviction and come back on the next access.
pub struct ChunkManager {
    layer: i32,
    seed: i32,
    chunk_size: i32,
    biomes: Arc<BiomeRegistry>,
    resident: LruCache<ChunkKey, Chunk>,
    /// Edited chunks that were evicted. Render caches are already released.
    retained: HashMap<ChunkKey, Chunk>,
    /// Chunks edited since the last [`ChunkManager::take_dirty_chunks`].
    dirty: HashSet<ChunkKey>,
    /// Keys created since the last [`ChunkManager::take_generated`].
    generated: Vec<ChunkKey>,
    stats: ChunkStats,
}

impl ChunkManager {
    /// A capacity of zero is treated as one.
    pub fn new(
        layer: i32,
        seed: i32,
        chunk_size: i32,
        max_cached_chunks: usize,
        biomes: Arc<BiomeRegistry>,
    ) -> Self {
        let cap = NonZeroUsize::new(max_cached_chunks).unwrap_or(NonZeroUsize::MIN);
        Self {
            layer,
            seed,
            chunk_size,
            biomes,
            resident: LruCache::new(cap),
            retained: HashMap::new(),
            dirty: HashSet::new(),
            generated: Vec::new(),
            stats: ChunkStats::default(),
        }
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    pub fn biomes(&self) -> &Arc<BiomeRegistry> {
        &self.biomes
    }

    pub fn capacity(&self) -> usize {
        self.resident.cap().get()
    }

    /// Number of resident chunks. Never exceeds [`ChunkManager::capacity`].
    pub fn chunk_count(&self) -> usize {
        self.resident.len()
    }

    pub fn stats(&self) -> ChunkStats {
        self.stats
    }

    /// The chunk at `(cx, cy)`, created if it is not resident.
    ///
    /// Marks the chunk most-recently-used. On a miss with the cache full, the
    /// least-recently-used chunk is evicted first.
    pub fn get_chunk(&mut self, cx: i32, cy: i32) -> &mut Chunk {
        let key = ChunkKey::new(self.layer, cx, cy);
        if self.resident.contains(&key) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            if self.resident.len() >= self.resident.cap().get() {
                self.evict_lru();
            }
            self.generated.push(key);
        }

        let Self {
            resident,
            retained,
            biomes,
            seed,
            chunk_size,
            stats,
            ..
        } = self;
        resident.get_or_insert_mut(key, || match retained.remove(&key) {
            Some(chunk) => {
                stats.restored += 1;
                tracing::debug!("Restored edited chunk {}", key);
                chunk
            }
            None => generate_chunk(key, *seed, *chunk_size, biomes),
        })
    }

    /// The chunk holding `tile`, created if needed.
    pub fn chunk_for_tile(&mut self, tile: TilePos) -> &mut Chunk {
        let (cx, cy) = tile.chunk(self.chunk_size);
        self.get_chunk(cx, cy)
    }

    /// Resident chunk at `(cx, cy)` without touching LRU order.
    pub fn peek_chunk(&self, cx: i32, cy: i32) -> Option<&Chunk> {
        self.resident.peek(&ChunkKey::new(self.layer, cx, cy))
    }

    pub fn is_resident(&self, cx: i32, cy: i32) -> bool {
        self.resident.contains(&ChunkKey::new(self.layer, cx, cy))
    }

    /// Resident keys from most- to least-recently-used.
    pub fn resident_keys(&self) -> Vec<ChunkKey> {
        self.resident.iter().map(|(key, _)| *key).collect()
    }

    pub fn tile_at(&mut self, tile: TilePos) -> TileId {
        let local = tile.local(self.chunk_size);
        self.chunk_for_tile(tile).tile(local)
    }

    /// Overwrite one terrain tile, creating its chunk if needed. Edited chunks
    /// are marked dirty and survive eviction.
    pub fn set_tile(&mut self, tile: TilePos, id: TileId) -> bool {
        let local = tile.local(self.chunk_size);
        let chunk = self.chunk_for_tile(tile);
        let key = chunk.key();
        let changed = chunk.set_tile(local, id);
        if changed {
            self.dirty.insert(key);
        }
        changed
    }

    /// Release every resident render cache (shutdown or full invalidation).
    pub fn unbake_all(&mut self) {
        let mut released = 0;
        for (_, chunk) in self.resident.iter_mut() {
            if chunk.is_baked() {
                chunk.unbake();
                released += 1;
            }
        }
        tracing::debug!("Unbaked {} chunks", released);
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Drain and return every chunk edited since the last call, sorted by
    /// coordinates.
    pub fn take_dirty_chunks(&mut self) -> Vec<ChunkKey> {
        let mut dirty: Vec<ChunkKey> = self.dirty.drain().collect();
        dirty.sort_by_key(|k| (k.y, k.x));
        dirty
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// An edited chunk's current state, resident or retained, for saving.
    /// Does not touch LRU order.
    pub fn export_chunk(&self, key: ChunkKey) -> Option<&Chunk> {
        self.resident.peek(&key).or_else(|| self.retained.get(&key))
    }

    /// Install a chunk loaded from storage. It replaces whatever is resident
    /// for that key and is treated as edited, so it survives eviction. It is
    /// not marked dirty.
    pub fn restore_chunk(&mut self, mut chunk: Chunk) -> Result<(), WorldError> {
        let key = chunk.key();
        if key.layer != self.layer {
            return Err(WorldError::InvalidConfiguration(format!(
                "chunk {} does not belong to layer {}",
                key, self.layer
            )));
        }
        if chunk.edge() != self.chunk_size {
            return Err(WorldError::InvalidConfiguration(format!(
                "chunk {} has edge {}, expected {}",
                key,
                chunk.edge(),
                self.chunk_size
            )));
        }
        chunk.mark_modified();
        self.retained.remove(&key);
        if !self.resident.contains(&key) && self.resident.len() >= self.resident.cap().get() {
            self.evict_lru();
        }
        self.resident.put(key, chunk);
        Ok(())
    }

    /// Drain the keys of chunks created since the last call, in creation order.
    pub fn take_generated(&mut self) -> Vec<ChunkKey> {
        std::mem::take(&mut self.generated)
    }

    fn evict_lru(&mut self) {
        let Some((key, mut chunk)) = self.resident.pop_lru() else {
            return;
        };
        chunk.unbake();
        self.stats.evictions += 1;
        if chunk.is_modified() {
            tracing::debug!("Evicted edited chunk {}, retaining terrain", key);
            self.retained.insert(key, chunk);
        } else {
            tracing::debug!("Evicted chunk {}", key);
        }
    }

    /// Biome picked for a fresh chunk at `(cx, cy)`.
    pub fn biome_for(&self, cx: i32, cy: i32) -> BiomeId {
        pick_biome(&self.biomes, self.seed, self.layer, cx, cy)
    }
}

fn pick_biome(biomes: &BiomeRegistry, seed: i32, layer: i32, cx: i32, cy: i32) -> BiomeId {
    let salt = seed ^ layer.wrapping_mul(BIOME_LAYER_PRIME);
    let spawnable = biomes.spawnable();
    match spawnable.len() {
        0 => BiomeId::NONE,
        n => spawnable[hash32(cx, cy, salt) as usize % n],
    }
}

fn generate_chunk(key: ChunkKey, seed: i32, chunk_size: i32, biomes: &BiomeRegistry) -> Chunk {
    let biome = pick_biome(biomes, seed, key.layer, key.x, key.y);
    let fill = biomes.get(biome).base_tile;
    tracing::debug!("Generated chunk {} ({})", key, biomes.get(biome).name);
    Chunk::filled(key, biome, chunk_size, fill)
}
