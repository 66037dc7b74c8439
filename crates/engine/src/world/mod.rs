pub mod biome;
pub mod chunk;
pub mod chunk_manager;
pub mod feature_cache;
pub mod hash;
pub mod modifications;
pub mod position;
pub mod procgen;
pub mod tile;

use std::collections::HashMap;
use std::sync::Arc;

use glam::{IVec2, Vec2};

use crate::collision::CollisionResolver;
use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::objects::{House, ObjectId, WorldObject, WorldObjectStore};
use crate::road::{Road, RoadConfig, RoadId, RoadNetwork, RoadType};
use biome::BiomeRegistry;
use chunk::Chunk;
use chunk_manager::ChunkManager;
use feature_cache::FeatureCache;
use modifications::{ExclusionZone, ObjectModificationStore, ProcObjectKey, ZoneId};
use position::{ChunkKey, ChunkRange, TilePos, TileRect};
use procgen::FeatureGenerator;
use tile::TileRegistry;

/// One layer of the tile world and everything placed on it.
///
/// Owns the chunk cache, the explicit objects, the procedural deviations and
/// the roads, and hands out a [`CollisionResolver`] over them. All mutation
/// goes through `&mut self`; there is no internal locking.
pub struct World {
    config: WorldConfig,
    tiles: TileRegistry,
    chunks: ChunkManager,
    features: FeatureGenerator,
    feature_cache: FeatureCache,
    objects: WorldObjectStore,
    mods: ObjectModificationStore,
    roads: RoadNetwork,
    /// Exclusion zones owned by placed structures, removed with them.
    structure_zones: HashMap<ObjectId, ZoneId>,
}

impl World {
    /// A world using the config's biome table (or the standard one).
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        let biomes = Arc::new(config.biome_registry()?);
        Self::with_biomes(config, biomes)
    }

    /// A world over an explicit biome table, ignoring `config.biomes`.
    pub fn with_biomes(config: WorldConfig, biomes: Arc<BiomeRegistry>) -> Result<Self, WorldError> {
        config.validate()?;
        let size = config.chunk_size;
        let chunks = ChunkManager::new(
            config.layer_id,
            config.world_seed,
            size,
            config.max_cached_chunks,
            biomes.clone(),
        );
        tracing::info!(
            "World layer {} seed {}: {}-tile chunks, {} cached",
            config.layer_id,
            config.world_seed,
            size,
            config.max_cached_chunks
        );
        Ok(Self {
            tiles: TileRegistry::standard(),
            chunks,
            features: FeatureGenerator::new(biomes, size),
            feature_cache: FeatureCache::new(config.max_cached_chunks),
            objects: WorldObjectStore::new(size),
            mods: ObjectModificationStore::new(size),
            roads: RoadNetwork::new(size),
            structure_zones: HashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn layer(&self) -> i32 {
        self.config.layer_id
    }

    pub fn chunk_size(&self) -> i32 {
        self.config.chunk_size
    }

    pub fn tiles(&self) -> &TileRegistry {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut TileRegistry {
        &mut self.tiles
    }

    pub fn chunks(&self) -> &ChunkManager {
        &self.chunks
    }

    /// For renderers attaching or releasing chunk render caches. Saved chunks
    /// go through [`World::restore_chunk`].
    pub fn chunks_mut(&mut self) -> &mut ChunkManager {
        &mut self.chunks
    }

    /// Install a chunk loaded from storage and drop the procedural objects
    /// cached for its key, which were rolled for the replaced terrain.
    pub fn restore_chunk(&mut self, chunk: Chunk) -> Result<(), WorldError> {
        let key = chunk.key();
        self.chunks.restore_chunk(chunk)?;
        self.feature_cache.invalidate_chunk(key);
        Ok(())
    }

    pub fn features(&self) -> &FeatureGenerator {
        &self.features
    }

    pub fn feature_cache(&self) -> &FeatureCache {
        &self.feature_cache
    }

    pub fn objects(&self) -> &WorldObjectStore {
        &self.objects
    }

    pub fn modifications(&self) -> &ObjectModificationStore {
        &self.mods
    }

    pub fn modifications_mut(&mut self) -> &mut ObjectModificationStore {
        &mut self.mods
    }

    pub fn roads(&self) -> &RoadNetwork {
        &self.roads
    }

    // ── Collision ───────────────────────────────────────────────────────

    pub fn collision(&mut self) -> CollisionResolver<'_> {
        CollisionResolver::new(
            &mut self.chunks,
            &self.features,
            &self.objects,
            &self.mods,
            self.config.player_radius_tiles,
        )
    }

    pub fn resolve_movement(&mut self, current: Vec2, desired: Vec2) -> Vec2 {
        self.collision().resolve_movement(current, desired)
    }

    pub fn is_tile_solid(&mut self, x: i32, y: i32) -> bool {
        self.collision().is_tile_solid(x, y)
    }

    /// Solidity as a renderer sees it: cached procedural objects plus explicit
    /// objects. Always agrees with [`World::is_tile_solid`].
    pub fn debug_is_tile_solid(&mut self, x: i32, y: i32) -> bool {
        let layer = self.layer();
        let key = ChunkKey::containing(layer, TilePos::new(x, y), self.chunk_size());
        let biome = self.chunks.get_chunk(key.x, key.y).biome();
        self.feature_cache
            .is_solid_tile(&self.features, &self.mods, key, biome, x, y)
            || self.objects.is_solid_tile(layer, x, y)
    }

    /// Visible procedural objects of chunk `(cx, cy)`, cached.
    pub fn procedural_objects_in_chunk(&mut self, cx: i32, cy: i32) -> &[WorldObject] {
        let key = ChunkKey::new(self.layer(), cx, cy);
        let biome = self.chunks.get_chunk(cx, cy).biome();
        self.feature_cache
            .objects_in_chunk(&self.features, &self.mods, key, biome)
    }

    /// Chunks within `render_distance` of `center` (tile units).
    pub fn view_range(&self, center: Vec2) -> ChunkRange {
        let (cx, cy) = TilePos::containing(center).chunk(self.chunk_size());
        let d = self.config.render_distance;
        ChunkRange::new(cx - d, cy - d, cx + d, cy + d)
    }

    /// Make every chunk in `range` resident and build its procedural objects
    /// in parallel.
    pub fn warm(&mut self, range: ChunkRange) {
        let layer = self.layer();
        let targets: Vec<_> = range
            .iter()
            .map(|(cx, cy)| (ChunkKey::new(layer, cx, cy), self.chunks.get_chunk(cx, cy).biome()))
            .collect();
        self.feature_cache.warm(&self.features, &self.mods, &targets);
    }

    /// Walking speed multiplier of the terrain under `pos`.
    pub fn movement_speed_at(&mut self, pos: Vec2) -> f32 {
        let tile = self.chunks.tile_at(TilePos::containing(pos));
        self.tiles.movement_speed(tile)
    }

    // ── Placement ───────────────────────────────────────────────────────

    /// Build a house and keep procedural features `padding` tiles clear of it.
    pub fn place_house(
        &mut self,
        bounds: TileRect,
        door: IVec2,
        door_width: i32,
        padding: f32,
    ) -> Result<ObjectId, WorldError> {
        if bounds.is_empty() {
            return Err(WorldError::InvalidConfiguration(format!(
                "house bounds {}x{} are empty",
                bounds.w, bounds.h
            )));
        }
        if !bounds.fits() {
            return Err(WorldError::InvalidConfiguration(format!(
                "house at ({}, {}) {}x{} extends past the tile coordinate range",
                bounds.x, bounds.y, bounds.w, bounds.h
            )));
        }
        let id = self.objects.new_id();
        let house = House::with_size(id, self.layer(), bounds).with_door(door, door_width);
        self.objects.add(house.into())?;
        let zone = self
            .mods
            .add_exclusion_zone(ExclusionZone::rectangular(bounds, padding));
        self.structure_zones.insert(id, zone);
        tracing::info!(
            "Placed house {} at ({}, {}) {}x{}",
            id,
            bounds.x,
            bounds.y,
            bounds.w,
            bounds.h
        );
        Ok(id)
    }

    /// Store an explicit object without any exclusion zone.
    pub fn place_object(&mut self, object: WorldObject) -> Result<ObjectId, WorldError> {
        self.objects.add(object)
    }

    pub fn next_object_id(&mut self) -> ObjectId {
        self.objects.new_id()
    }

    /// Remove an explicit object and any exclusion zone it owned.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<WorldObject> {
        let object = self.objects.remove(id)?;
        if let Some(zone) = self.structure_zones.remove(&id) {
            self.mods.remove_exclusion_zone(zone);
        }
        Some(object)
    }

    /// Generate a road into this layer and keep procedural features off it.
    pub fn generate_road(
        &mut self,
        id: RoadId,
        name: &str,
        config: &RoadConfig,
        kind: RoadType,
    ) -> Result<Arc<Road>, WorldError> {
        let road = crate::road::generate_road(
            &mut self.chunks,
            &mut self.roads,
            id,
            name,
            config,
            kind,
            self.config.layer_id,
        )?;
        self.mods.add_exclusion_zone(ExclusionZone::road(road.clone()));
        Ok(road)
    }

    pub fn road_at(&self, pos: Vec2) -> Option<&Arc<Road>> {
        self.roads.road_at(pos)
    }

    /// Remove the visible procedural feature on `(x, y)`, if any, and return
    /// its key.
    pub fn delete_feature_at(&mut self, x: i32, y: i32) -> Option<ProcObjectKey> {
        let chunk = self.chunks.chunk_for_tile(TilePos::new(x, y));
        let object = self.features.visible_feature_at(chunk, &self.mods, x, y)?;
        let kind = object.proc_kind()?;
        let key = ProcObjectKey::at(self.config.layer_id, TilePos::new(x, y), self.config.chunk_size, kind);
        self.mods.delete_object(key);
        tracing::debug!("Deleted {:?} at ({}, {})", kind, x, y);
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_world() -> World {
        let config = WorldConfig {
            chunk_size: 16,
            max_cached_chunks: 8,
            ..Default::default()
        };
        World::new(config).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = WorldConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(World::new(config).is_err());
    }

    #[test]
    fn removing_house_lifts_its_zone() {
        let mut world = small_world();
        let id = world
            .place_house(TileRect::new(0, 0, 6, 6), IVec2::new(3, 5), 1, 2.0)
            .unwrap();
        assert!(world.modifications().is_in_exclusion_zone(Vec2::new(-1.0, -1.0)));
        assert!(world.remove_object(id).is_some());
        assert!(!world.modifications().is_in_exclusion_zone(Vec2::new(-1.0, -1.0)));
        assert!(world.objects().is_empty());
    }

    #[test]
    fn empty_house_rejected() {
        let mut world = small_world();
        assert!(world.place_house(TileRect::new(0, 0, 0, 3), IVec2::ZERO, 1, 0.0).is_err());
        assert!(world.objects().is_empty());
    }

    #[test]
    fn house_past_coordinate_limit_rejected() {
        let mut world = small_world();
        let result = world.place_house(TileRect::new(i32::MAX - 3, 0, 6, 6), IVec2::new(3, 5), 1, 2.0);
        assert!(matches!(result, Err(WorldError::InvalidConfiguration(_))));
        assert!(world.objects().is_empty());
        assert!(!world.modifications().is_in_exclusion_zone(Vec2::new(i32::MAX as f32 - 2.0, 1.0)));

        let id = world
            .place_house(TileRect::new(i32::MAX - 6, 0, 6, 6), IVec2::new(3, 5), 1, 0.0)
            .unwrap();
        assert!(world.objects().get(id).is_some());
        assert!(world.objects().is_solid_tile(0, i32::MAX - 1, 0));
    }

    #[test]
    fn view_range_is_centred_on_player_chunk() {
        let world = small_world();
        assert_eq!(world.view_range(Vec2::new(-0.5, 20.0)), ChunkRange::new(-4, -2, 2, 4));
    }

    #[test]
    fn warm_fills_feature_cache() {
        let mut world = small_world();
        world.warm(ChunkRange::new(0, 0, 1, 0));
        assert_eq!(world.feature_cache().len(), 2);
        assert_eq!(world.chunks().chunk_count(), 2);
    }
}
