//! Cross-module behaviour of the tile world: generation, caching, placement,
//! roads and collision, driven through the public API only.

use std::sync::Arc;

use glam::{IVec2, Vec2};
use tileworld_engine::config::WorldConfig;
use tileworld_engine::objects::{Rock, RockType, WorldObject};
use tileworld_engine::road::{RoadConfig, RoadId, RoadType, RoadWidthSegment, sample_path};
use tileworld_engine::world::World;
use tileworld_engine::world::biome::{BiomeDefinition, BiomeId, BiomeRegistry};
use tileworld_engine::world::chunk_manager::ChunkManager;
use tileworld_engine::world::modifications::{ExclusionZone, ProcObjectKey, ProcObjectKind};
use tileworld_engine::world::position::{ChunkKey, LocalTilePos, TilePos, TileRect};
use tileworld_engine::world::procgen::FeatureGenerator;
use tileworld_engine::world::tile::TileId;
use tileworld_engine::WorldError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// One spawnable biome with the given chances, plus None.
fn biomes(boulder: u16, tree: u16) -> Arc<BiomeRegistry> {
    Arc::new(
        BiomeRegistry::from_definitions(vec![
            BiomeDefinition::none(),
            BiomeDefinition::new(BiomeId(1), "Synthetic", TileId::GRASS).with_chances(boulder, tree),
        ])
        .unwrap(),
    )
}

fn world_with(biomes: Arc<BiomeRegistry>) -> World {
    World::with_biomes(WorldConfig::default(), biomes).unwrap()
}

fn barren_world() -> World {
    world_with(biomes(0, 0))
}

fn forest_world() -> World {
    world_with(biomes(0, 1024))
}

fn standard_manager(cap: usize) -> ChunkManager {
    ChunkManager::new(0, 1_234_567, 32, cap, Arc::new(BiomeRegistry::standard()))
}

fn rock_at(world: &mut World, x: i32, y: i32) {
    let rock = Rock {
        id: world.next_object_id(),
        layer: 0,
        tile: TilePos::new(x, y),
        variant: RockType::Large,
    };
    world.place_object(rock.into()).unwrap();
}

// ---------------------------------------------------------------------------
// Chunk generation and the LRU
// ---------------------------------------------------------------------------

#[test]
fn chunk_regenerates_identically_after_eviction() {
    let mut m = standard_manager(2);
    let first = m.get_chunk(3, -7);
    let (terrain, biome) = (first.terrain().to_vec(), first.biome());

    m.get_chunk(100, 100);
    m.get_chunk(-100, 5);
    assert!(!m.is_resident(3, -7));

    let again = m.get_chunk(3, -7);
    assert_eq!(again.terrain(), terrain.as_slice());
    assert_eq!(again.biome(), biome);

    let mut other = standard_manager(8);
    assert_eq!(other.get_chunk(3, -7).terrain(), terrain.as_slice());
}

#[test]
fn seed_and_layer_change_biome_layout() {
    let reg = Arc::new(BiomeRegistry::standard());
    let base = ChunkManager::new(0, 1, 32, 4, reg.clone());
    let reseeded = ChunkManager::new(0, 2, 32, 4, reg.clone());
    let other_layer = ChunkManager::new(1, 1, 32, 4, reg);
    let layout = |m: &ChunkManager| (0..64).map(|i| m.biome_for(i, -i)).collect::<Vec<_>>();
    assert_ne!(layout(&base), layout(&reseeded));
    assert_ne!(layout(&base), layout(&other_layer));
}

#[test]
fn both_standard_biomes_appear() {
    let m = standard_manager(4);
    let picked: Vec<_> = (0..64).map(|i| m.biome_for(i, i * 3)).collect();
    assert!(picked.contains(&BiomeId::GRASSY_PLAIN));
    assert!(picked.contains(&BiomeId::DESERT));
    assert!(!picked.contains(&BiomeId::NONE));
}

#[test]
fn terrain_is_filled_with_biome_base_tile() {
    let mut m = standard_manager(4);
    for (cx, cy) in [(0, 0), (1, 0), (-5, 9)] {
        let chunk = m.get_chunk(cx, cy);
        let expected = match chunk.biome() {
            BiomeId::DESERT => TileId::SAND,
            _ => TileId::GRASS,
        };
        assert_eq!(chunk.terrain().len(), 32 * 32);
        assert!(chunk.terrain().iter().all(|t| *t == expected));
    }
}

#[test]
fn negative_tiles_land_in_floor_chunk() {
    let t = TilePos::new(-1, -1);
    assert_eq!(t.chunk(32), (-1, -1));
    assert_eq!(t.local(32), LocalTilePos { x: 31, y: 31 });
    assert_eq!(TilePos::new(0, 0).chunk(32), (0, 0));
    assert_eq!(TilePos::new(0, 0).local(32), LocalTilePos { x: 0, y: 0 });

    let mut m = standard_manager(4);
    m.set_tile(TilePos::new(-1, -1), TileId::ROAD);
    let chunk = m.peek_chunk(-1, -1).unwrap();
    assert_eq!(chunk.terrain()[31 * 32 + 31], TileId::ROAD);
    assert_eq!(chunk.tile(LocalTilePos { x: 31, y: 31 }), TileId::ROAD);
    assert!(m.peek_chunk(0, 0).is_none());
}

#[test]
fn lru_evicts_least_recently_touched() {
    let mut m = standard_manager(4);
    for x in 0..4 {
        m.get_chunk(x, 0);
    }
    m.get_chunk(1, 0);
    m.get_chunk(4, 0);
    m.get_chunk(5, 0);

    assert_eq!(m.chunk_count(), 4);
    let resident: Vec<_> = m.resident_keys().iter().map(|k| k.x).collect();
    assert_eq!(resident, vec![5, 4, 1, 3]);
    assert!(!m.is_resident(0, 0));
    assert!(!m.is_resident(2, 0));
}

#[test]
fn lru_bound_holds_under_churn() {
    let mut m = standard_manager(16);
    for i in 0..500 {
        m.get_chunk(i % 37, i / 37);
        assert!(m.chunk_count() <= 16);
    }
    assert_eq!(m.chunk_count(), 16);
    assert_eq!(m.stats().evictions, m.stats().misses - 16);
}

// ---------------------------------------------------------------------------
// Procedural features
// ---------------------------------------------------------------------------

#[test]
fn chunk_objects_are_idempotent() {
    let reg = Arc::new(BiomeRegistry::standard());
    let generator = FeatureGenerator::new(reg.clone(), 32);
    let mut m = ChunkManager::new(0, 1_234_567, 32, 4, reg);

    let first = generator.generate_chunk_objects(m.get_chunk(2, -3), 2, -3);
    m.get_chunk(9, 9);
    m.set_tile(TilePos::new(64, -96), TileId::ROAD);
    let second = generator.generate_chunk_objects(m.get_chunk(2, -3), 2, -3);

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn exclusion_zone_hides_feature_from_render_and_collision() {
    let mut world = world_with(Arc::new(BiomeRegistry::standard()));
    let (cx, cy) = (1, 1);

    let target = world.procedural_objects_in_chunk(cx, cy)[0].clone();
    let tile = TilePos::containing(target.position());
    assert!(world.is_tile_solid(tile.x, tile.y));

    world
        .modifications_mut()
        .add_exclusion_zone(ExclusionZone::rectangular(TileRect::tile(tile), 0.0));

    assert!(!world.is_tile_solid(tile.x, tile.y));
    assert!(!world.debug_is_tile_solid(tile.x, tile.y));
    assert!(!world
        .procedural_objects_in_chunk(cx, cy)
        .iter()
        .any(|o| o.bounds() == TileRect::tile(tile)));
}

#[test]
fn deletion_hides_only_that_feature() {
    let mut world = forest_world();
    let key = ProcObjectKey::at(0, TilePos::new(10, 10), 32, ProcObjectKind::Tree);
    world.modifications_mut().delete_object(key);

    assert!(!world.is_tile_solid(10, 10));
    assert!(!world.debug_is_tile_solid(10, 10));
    for (x, y) in [(9, 10), (11, 10), (10, 9), (10, 11)] {
        assert!(world.is_tile_solid(x, y), "({x},{y})");
    }
    assert_eq!(world.procedural_objects_in_chunk(0, 0).len(), 32 * 32 - 1);
}

#[test]
fn delete_feature_at_returns_key_once() {
    let mut world = forest_world();
    let key = world.delete_feature_at(-4, 7).unwrap();
    assert_eq!(key.kind, ProcObjectKind::Tree);
    assert_eq!(key.tile(32), TilePos::new(-4, 7));
    assert!(world.delete_feature_at(-4, 7).is_none());
}

// ---------------------------------------------------------------------------
// Collision
// ---------------------------------------------------------------------------

#[test]
fn diagonal_move_slides_along_x() {
    let mut world = barren_world();
    rock_at(&mut world, 5, 5);
    let end = world.resolve_movement(Vec2::new(4.5, 4.5), Vec2::new(5.5, 5.5));
    assert_eq!(end, Vec2::new(5.5, 4.5));
}

#[test]
fn diagonal_move_slides_along_y() {
    let mut world = barren_world();
    rock_at(&mut world, 5, 5);
    rock_at(&mut world, 5, 4);
    let end = world.resolve_movement(Vec2::new(4.5, 4.5), Vec2::new(5.5, 5.5));
    assert_eq!(end, Vec2::new(4.5, 5.5));
}

#[test]
fn fully_blocked_move_stays_put() {
    let mut world = barren_world();
    for (x, y) in [(5, 5), (5, 4), (4, 5)] {
        rock_at(&mut world, x, y);
    }
    let start = Vec2::new(4.5, 4.5);
    assert_eq!(world.resolve_movement(start, Vec2::new(5.5, 5.5)), start);
}

#[test]
fn open_ground_moves_freely() {
    let mut world = barren_world();
    let end = world.resolve_movement(Vec2::new(-0.5, -0.5), Vec2::new(-3.25, 2.75));
    assert_eq!(end, Vec2::new(-3.25, 2.75));
}

#[test]
fn radius_reaches_neighbouring_tiles() {
    let mut world = barren_world();
    rock_at(&mut world, 5, 5);
    let mut c = world.collision();
    assert!(c.is_solid_at(Vec2::new(4.7, 5.5)));
    assert!(!c.is_solid_at(Vec2::new(4.6, 5.5)));
    // Diagonal neighbour is only hit inside the circle, not the square.
    assert!(!c.is_solid_at(Vec2::new(4.75, 4.75)));
}

// ---------------------------------------------------------------------------
// Houses
// ---------------------------------------------------------------------------

#[test]
fn house_border_is_solid_except_door() {
    let mut world = barren_world();
    let bounds = TileRect::new(14, 4, 20, 20);
    world.place_house(bounds, IVec2::new(3, 19), 1, 5.0).unwrap();

    for ly in -1..=20 {
        for lx in -1..=20 {
            let (x, y) = (bounds.x + lx, bounds.y + ly);
            let inside = (0..20).contains(&lx) && (0..20).contains(&ly);
            let border = inside && (lx == 0 || ly == 0 || lx == 19 || ly == 19);
            let door = lx == 3 && ly == 19;
            assert_eq!(
                world.is_tile_solid(x, y),
                border && !door,
                "local ({lx},{ly})"
            );
        }
    }
}

#[test]
fn house_padding_clears_procedural_features() {
    let mut world = forest_world();
    world
        .place_house(TileRect::new(14, 4, 20, 20), IVec2::new(3, 19), 1, 5.0)
        .unwrap();
    // Inside the padding ring: no tree. Just outside: tree.
    assert!(!world.is_tile_solid(9, 10));
    assert!(!world.is_tile_solid(38, 28));
    assert!(world.is_tile_solid(8, 10));
    assert!(world.is_tile_solid(39, 28));
    // Interior is clear too.
    assert!(!world.is_tile_solid(20, 10));
}

// ---------------------------------------------------------------------------
// Roads
// ---------------------------------------------------------------------------

fn bend_config() -> RoadConfig {
    RoadConfig {
        control_points: vec![
            Vec2::new(-80.0, -20.0),
            Vec2::new(-40.0, -5.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(40.0, 20.0),
            Vec2::new(70.0, 60.0),
        ],
        width_segments: vec![RoadWidthSegment::new(0, 2, 3), RoadWidthSegment::new(2, 4, 5)],
        interpolation_steps: 60,
    }
}

#[test]
fn road_brush_covers_every_sampled_point() {
    let mut world = barren_world();
    let config = bend_config();
    world
        .generate_road(RoadId(1), "Bend", &config, RoadType::Dirt)
        .unwrap();

    let path = sample_path(&config).unwrap();
    assert_eq!(path.len(), 2 * 60);
    for sample in [path[0], path[37], path[60], path[119]] {
        let w = sample.width;
        for dy in -w..=w {
            for dx in -w..=w {
                if dx * dx + dy * dy > w * w {
                    continue;
                }
                let tile = TilePos::new(sample.tile.x + dx, sample.tile.y + dy);
                assert_eq!(world.chunks_mut().tile_at(tile), TileId::ROAD, "{tile:?}");
            }
        }
    }
}

#[test]
fn road_suppresses_features_and_is_queryable() {
    let mut world = forest_world();
    let road = world
        .generate_road(RoadId(7), "Bend", &bend_config(), RoadType::Gravel)
        .unwrap();
    assert!(!road.segments().is_empty());

    let on_road = Vec2::new(0.0, 0.0);
    assert_eq!(world.road_at(on_road).map(|r| r.id()), Some(RoadId(7)));
    assert!(!world.is_tile_solid(0, 0));
    assert!(world.is_tile_solid(0, 40));
    assert!(world.road_at(Vec2::new(0.0, 40.0)).is_none());
    assert!(world.movement_speed_at(on_road) > 1.0);
}

#[test]
fn road_segments_are_spaced() {
    let mut world = barren_world();
    let road = world
        .generate_road(RoadId(2), "Bend", &bend_config(), RoadType::Paved)
        .unwrap();
    for s in road.segments() {
        assert!(s.start.distance(s.end) >= 5.0);
    }
    for pair in road.segments().windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
}

#[test]
fn short_road_fails_before_touching_chunks() {
    let mut world = barren_world();
    let config = RoadConfig {
        control_points: vec![Vec2::ZERO, Vec2::ONE, Vec2::new(2.0, 2.0)],
        ..Default::default()
    };
    let err = world
        .generate_road(RoadId(1), "Stub", &config, RoadType::Dirt)
        .unwrap_err();
    assert!(matches!(err, WorldError::InvalidConfiguration(_)));
    assert_eq!(world.chunks().chunk_count(), 0);
    assert_eq!(world.chunks().dirty_count(), 0);
    assert!(world.roads().is_empty());
}

#[test]
fn road_terrain_survives_eviction() {
    let config = WorldConfig {
        max_cached_chunks: 2,
        ..Default::default()
    };
    let mut world = World::with_biomes(config, biomes(0, 0)).unwrap();
    world
        .generate_road(RoadId(1), "Bend", &bend_config(), RoadType::Dirt)
        .unwrap();
    assert_eq!(world.chunks().chunk_count(), 2);
    assert_eq!(world.chunks_mut().tile_at(TilePos::new(0, 0)), TileId::ROAD);
    assert_eq!(world.chunks_mut().tile_at(TilePos::new(-40, -5)), TileId::ROAD);
    assert_eq!(world.chunks().peek_chunk(0, 0).map(|c| c.key()), Some(ChunkKey::new(0, 0, 0)));
}

#[test]
fn explicit_point_objects_are_chunk_queryable() {
    let mut world = barren_world();
    rock_at(&mut world, -1, -1);
    let found = world.objects().query_by_chunk(0, -1, -1);
    assert!(matches!(found.as_slice(), [WorldObject::Rock(_)]));
}
