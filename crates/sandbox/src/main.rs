use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use glam::Vec2;
use tileworld_engine::world::position::TilePos;
use tileworld_sandbox::config::SandboxConfig;
use tileworld_sandbox::debug_view;
use tileworld_sandbox::event_bus::{EventBus, EventKind, WorldEvent};
use tileworld_sandbox::persistence;
use tileworld_sandbox::simulation::Walker;

/// Fixed simulation tick (20 Hz).
const TICK_SECONDS: f32 = 0.05;
const DEFAULT_STEPS: u32 = 4000;
/// Road control points the default tour follows after visiting the houses.
const ROAD_LEGS: usize = 4;
const MAP_RADIUS: i32 = 20;

fn arg_value(flag: &str) -> Option<String> {
    std::env::args().skip_while(|a| a != flag).nth(1)
}

fn main() {
    let config_path: Option<PathBuf> = arg_value("--config").map(PathBuf::from);
    let world_dir: PathBuf = arg_value("--world").unwrap_or_else(|| "world".into()).into();
    let steps: u32 = arg_value("--steps")
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_STEPS);
    let start = arg_value("--start")
        .and_then(|s| parse_point(&s))
        .unwrap_or(Vec2::new(0.5, 30.5));
    let show_map = std::env::args().any(|a| a == "--map");
    let no_save = std::env::args().any(|a| a == "--no-save");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = run(config_path.as_deref(), &world_dir, start, steps, show_map, !no_save) {
        tracing::error!("Sandbox failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run(
    config_path: Option<&Path>,
    world_dir: &Path,
    start: Vec2,
    steps: u32,
    show_map: bool,
    save: bool,
) -> Result<()> {
    tracing::info!("Tile world sandbox");

    let config = SandboxConfig::load_or_showcase(config_path)?;
    let mut world = config.build_world()?;
    tracing::info!(
        "Scenario ready: {} houses, {} roads, {} chunks touched",
        config.houses.len(),
        config.roads.len(),
        world.chunks().chunk_count()
    );

    // Saved edits go on top of the freshly generated scenario.
    match persistence::load_into(&mut world, world_dir) {
        Ok(0) => tracing::info!("No saved chunks found"),
        Ok(n) => tracing::info!("Loaded {} saved chunks from {}", n, world_dir.display()),
        Err(e) => tracing::error!("Failed to load saved chunks: {:#}", e),
    }
    // Chunks touched while building are not news to subscribers.
    world.chunks_mut().take_generated();

    let mut bus = EventBus::new();
    let loaded = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&loaded);
    bus.subscribe(EventKind::ChunkLoaded, move |_| counter.set(counter.get() + 1));
    bus.subscribe(EventKind::RoadEntered, |e| {
        if let WorldEvent::RoadEntered { road, name } = e {
            tracing::info!("Entered {} '{}'", road, name);
        }
    });
    bus.subscribe(EventKind::RoadLeft, |e| {
        if let WorldEvent::RoadLeft { road } = e {
            tracing::info!("Left {}", road);
        }
    });

    let route = default_route(&config, start);
    tracing::info!("Walking {} waypoints from {:?}", route.len(), start);
    let mut walker = Walker::new(start, route);
    let summary = walker.run(&mut world, &mut bus, TICK_SECONDS, steps);
    tracing::info!(
        "Streamed {} chunks, {} blocked steps",
        loaded.get(),
        summary.blocked_steps
    );

    if show_map {
        let center = TilePos::containing(walker.position());
        print!(
            "{}",
            debug_view::render_ascii(&mut world, center, MAP_RADIUS, Some(walker.position()))
        );
        println!("{}", debug_view::status_line(&world));
    }

    if save {
        let n = persistence::save_dirty(&mut world, world_dir)
            .with_context(|| format!("saving world to {}", world_dir.display()))?;
        tracing::info!("Save complete: {} chunks written", n);
    }
    Ok(())
}

/// Visit every house through its door, then follow the first road from its
/// control point nearest to where the house tour ended.
fn default_route(config: &SandboxConfig, start: Vec2) -> Vec<Vec2> {
    let mut route = Vec::new();
    for house in &config.houses {
        let b = house.bounds;
        let door = Vec2::new(
            (b.x + house.door.x) as f32 + house.door_width.max(1) as f32 * 0.5,
            (b.y + house.door.y) as f32 + 0.5,
        );
        let outside = door + Vec2::new(0.0, 2.0);
        route.extend([
            outside,
            door - Vec2::new(0.0, 2.0),
            outside,
            Vec2::new(b.x as f32 - 2.5, outside.y),
        ]);
    }

    if let Some(road) = config.roads.first() {
        let here = route.last().copied().unwrap_or(start);
        let points = &road.path.control_points;
        let nearest = points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.distance_squared(here).total_cmp(&b.distance_squared(here)))
            .map(|(i, _)| i);
        if let Some(first) = nearest {
            route.extend(points.iter().skip(first).take(ROAD_LEGS));
        }
    }
    route
}

fn parse_point(s: &str) -> Option<Vec2> {
    let (x, y) = s.split_once(',')?;
    Some(Vec2::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}
