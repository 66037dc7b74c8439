//! Benchmark: chunk streaming under a tight LRU bound.
//!
//! Walks a straight line far enough to cycle the chunk cache many times,
//! first with the sequential per-tile collision path only, then with the
//! feature cache warmed in parallel ahead of the walker.
//! Run with: `cargo run --release -p tileworld-sandbox --example chunk_churn`

use std::time::Instant;

use glam::Vec2;
use tileworld_engine::world::World;
use tileworld_engine::world::position::{ChunkRange, TilePos};
use tileworld_engine::WorldConfig;

fn main() {
    let distance = 4000.0_f32;
    let step = 0.5_f32;
    let max_cached = 64;

    println!("=== Tile world: chunk churn benchmark ===\n");
    println!("  {} tiles east, {} tiles per step, {} cached chunks\n", distance, step, max_cached);

    let config = WorldConfig {
        max_cached_chunks: max_cached,
        ..Default::default()
    };

    // --- Collision only ---
    let mut world = World::new(config.clone()).expect("valid config");
    let t0 = Instant::now();
    let end_plain = walk(&mut world, distance, step, false);
    let dt_plain = t0.elapsed();
    let stats = world.chunks().stats();
    println!(
        "  Collision only: {:>8.2?}  (misses {}, evictions {})",
        dt_plain, stats.misses, stats.evictions
    );

    // --- With parallel feature warm-up ---
    let mut world_warm = World::new(config).expect("valid config");
    let t0 = Instant::now();
    let end_warm = walk(&mut world_warm, distance, step, true);
    let dt_warm = t0.elapsed();
    let stats = world_warm.chunks().stats();
    println!(
        "  With warm-up:   {:>8.2?}  (misses {}, evictions {}, feature cache {})",
        dt_warm,
        stats.misses,
        stats.evictions,
        world_warm.feature_cache().len()
    );

    // --- Verify identical ---
    if end_plain == end_warm {
        println!("\n  OK: both walks ended at {:?}", end_plain);
    } else {
        println!("\n  MISMATCH: {:?} vs {:?}", end_plain, end_warm);
    }
    assert!(world.chunks().chunk_count() <= max_cached);
}

fn walk(world: &mut World, distance: f32, step: f32, warm: bool) -> Vec2 {
    let mut pos = Vec2::new(0.5, 0.5);
    let mut last_chunk = None;
    let steps = (distance / step) as u32;
    for i in 0..steps {
        if warm {
            let chunk = TilePos::containing(pos).chunk(world.chunk_size());
            if last_chunk != Some(chunk) {
                last_chunk = Some(chunk);
                let (cx, cy) = chunk;
                world.warm(ChunkRange::new(cx, cy - 1, cx + 2, cy + 1));
            }
        }
        // Weave north and south so the walker sweeps a band of chunks.
        let drift = if (i / 200) % 2 == 0 { step } else { -step };
        let desired = pos + Vec2::new(step, drift);
        pos = world.resolve_movement(pos, desired);
    }
    pos
}
