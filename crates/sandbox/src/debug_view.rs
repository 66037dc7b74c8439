//! ASCII rendering of the area around a point, built from the same cached
//! view a renderer would draw from.

use std::fmt::Write;

use glam::Vec2;
use tileworld_engine::world::World;
use tileworld_engine::world::modifications::ProcObjectKind;
use tileworld_engine::world::position::TilePos;
use tileworld_engine::world::tile::TileId;

pub const PLAYER: char = '@';
pub const WALL: char = '#';
pub const TREE: char = 'T';
pub const ROCK: char = 'o';

fn terrain_glyph(tile: TileId) -> char {
    match tile {
        TileId::GRASS => '.',
        TileId::SAND => ':',
        TileId::ROCKY => '^',
        TileId::ROAD => '=',
        _ => ' ',
    }
}

/// Map of the `(2 * radius + 1)` square centred on `center`, one row per line.
///
/// Explicit solid tiles draw as walls, visible procedural features by kind,
/// everything else as its terrain.
pub fn render_ascii(world: &mut World, center: TilePos, radius: i32, player: Option<Vec2>) -> String {
    let player = player.map(TilePos::containing);
    let layer = world.layer();
    let size = world.chunk_size();
    let side = (2 * radius + 1).max(0) as usize;
    let mut out = String::with_capacity(side * (side + 1));

    for y in center.y - radius..=center.y + radius {
        for x in center.x - radius..=center.x + radius {
            let tile = TilePos::new(x, y);
            let glyph = if player == Some(tile) {
                PLAYER
            } else if world.objects().is_solid_tile(layer, x, y) {
                WALL
            } else if let Some(kind) = feature_kind(world, tile, size) {
                match kind {
                    ProcObjectKind::Tree => TREE,
                    ProcObjectKind::Rock => ROCK,
                }
            } else {
                terrain_glyph(world.chunks_mut().tile_at(tile))
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

fn feature_kind(world: &mut World, tile: TilePos, size: i32) -> Option<ProcObjectKind> {
    let (cx, cy) = tile.chunk(size);
    world
        .procedural_objects_in_chunk(cx, cy)
        .iter()
        .find(|o| o.bounds().contains(tile.x, tile.y))
        .and_then(|o| o.proc_kind())
}

/// One-line summary of chunk and cache state.
pub fn status_line(world: &World) -> String {
    let stats = world.chunks().stats();
    let mut line = String::new();
    let _ = write!(
        line,
        "chunks {}/{} (hits {}, misses {}, evicted {}, restored {}), feature cache {}, objects {}, roads {}",
        world.chunks().chunk_count(),
        world.chunks().capacity(),
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.restored,
        world.feature_cache().len(),
        world.objects().len(),
        world.roads().len(),
    );
    line
}
