//! Headless player simulation.
//!
//! A [`Walker`] follows a list of waypoints through the collision resolver,
//! scaling its speed by the terrain underfoot. Every step keeps the chunks
//! around the player warm and reports what happened on the [`EventBus`]:
//! movement, newly created chunks, and road transitions.

use glam::Vec2;
use tileworld_engine::road::RoadId;
use tileworld_engine::world::World;
use tileworld_engine::world::position::TilePos;

use crate::event_bus::{EventBus, WorldEvent};

/// Distance at which a waypoint counts as reached.
pub const ARRIVAL_RADIUS: f32 = 0.1;

/// Consecutive fully blocked steps before the walker gives up on a waypoint.
pub const STUCK_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WalkSummary {
    pub steps: u32,
    pub distance: f32,
    /// Steps that ended where they started although a waypoint remained.
    pub blocked_steps: u32,
    pub waypoints_reached: usize,
    pub waypoints_skipped: usize,
    pub chunks_loaded: usize,
}

#[derive(Debug, Clone)]
pub struct Walker {
    position: Vec2,
    waypoints: Vec<Vec2>,
    next: usize,
    stuck: u32,
    road: Option<RoadId>,
    chunk: Option<(i32, i32)>,
    summary: WalkSummary,
}

impl Walker {
    pub fn new(start: Vec2, waypoints: Vec<Vec2>) -> Self {
        Self {
            position: start,
            waypoints,
            next: 0,
            stuck: 0,
            road: None,
            chunk: None,
            summary: WalkSummary::default(),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn current_road(&self) -> Option<RoadId> {
        self.road
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.waypoints.len()
    }

    pub fn summary(&self) -> WalkSummary {
        self.summary
    }

    /// Advance one tick of `dt` seconds.
    pub fn step(&mut self, world: &mut World, bus: &mut EventBus, dt: f32) {
        self.summary.steps += 1;
        self.stream_chunks(world, bus);

        let Some(&target) = self.waypoints.get(self.next) else {
            return;
        };
        let to_target = target - self.position;
        let remaining = to_target.length();
        if remaining <= ARRIVAL_RADIUS {
            self.advance(false);
            return;
        }

        let speed = world.config().player_speed * world.movement_speed_at(self.position);
        let desired = self.position + to_target / remaining * (speed * dt).min(remaining);
        let from = self.position;
        let resolved = world.resolve_movement(from, desired);

        if resolved == from {
            self.summary.blocked_steps += 1;
            self.stuck += 1;
            if self.stuck >= STUCK_LIMIT {
                tracing::debug!("Walker stuck at {:?}, skipping waypoint {:?}", from, target);
                self.advance(true);
            }
            return;
        }

        self.stuck = 0;
        self.position = resolved;
        self.summary.distance += from.distance(resolved);
        bus.publish(WorldEvent::PlayerMoved { from, to: resolved });
        self.track_road(world, bus);

        if resolved.distance(target) <= ARRIVAL_RADIUS {
            self.advance(false);
        }
    }

    /// Step until every waypoint is reached or skipped, or `max_steps` ran.
    pub fn run(&mut self, world: &mut World, bus: &mut EventBus, dt: f32, max_steps: u32) -> WalkSummary {
        for _ in 0..max_steps {
            if self.is_finished() {
                break;
            }
            self.step(world, bus, dt);
        }
        // Flush chunks created by the final step.
        self.stream_chunks(world, bus);
        tracing::info!(
            "Walk finished after {} steps: {:.1} tiles, {} waypoints reached, {} skipped, {} chunks loaded",
            self.summary.steps,
            self.summary.distance,
            self.summary.waypoints_reached,
            self.summary.waypoints_skipped,
            self.summary.chunks_loaded
        );
        self.summary
    }

    fn advance(&mut self, skipped: bool) {
        if skipped {
            self.summary.waypoints_skipped += 1;
        } else {
            self.summary.waypoints_reached += 1;
        }
        self.next += 1;
        self.stuck = 0;
    }

    /// Warm the view around the player when it enters a new chunk, and
    /// report every chunk created since the last call.
    fn stream_chunks(&mut self, world: &mut World, bus: &mut EventBus) {
        let chunk = TilePos::containing(self.position).chunk(world.chunk_size());
        if self.chunk != Some(chunk) {
            self.chunk = Some(chunk);
            let range = world.view_range(self.position);
            world.warm(range);
        }
        for key in world.chunks_mut().take_generated() {
            self.summary.chunks_loaded += 1;
            bus.publish(WorldEvent::ChunkLoaded(key));
        }
    }

    fn track_road(&mut self, world: &World, bus: &mut EventBus) {
        let here = world.road_at(self.position).map(|r| (r.id(), r.name().to_owned()));
        let here_id = here.as_ref().map(|(id, _)| *id);
        if here_id == self.road {
            return;
        }
        if let Some(left) = self.road.take() {
            bus.publish(WorldEvent::RoadLeft { road: left });
        }
        if let Some((road, name)) = here {
            tracing::debug!("Entered {} '{}'", road, name);
            bus.publish(WorldEvent::RoadEntered { road, name });
            self.road = Some(road);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use glam::IVec2;
    use tileworld_engine::WorldConfig;
    use tileworld_engine::world::biome::{BiomeDefinition, BiomeId, BiomeRegistry};
    use tileworld_engine::world::position::TileRect;
    use tileworld_engine::world::tile::TileId;

    fn barren_world() -> World {
        let biomes = BiomeRegistry::from_definitions(vec![
            BiomeDefinition::none(),
            BiomeDefinition::new(BiomeId(1), "Barren", TileId::GRASS).with_chances(0, 0),
        ])
        .unwrap();
        let config = WorldConfig {
            chunk_size: 16,
            render_distance: 1,
            ..Default::default()
        };
        World::with_biomes(config, Arc::new(biomes)).unwrap()
    }

    #[test]
    fn walks_to_every_waypoint() {
        let mut world = barren_world();
        let mut bus = EventBus::new();
        let mut walker = Walker::new(
            Vec2::new(0.5, 0.5),
            vec![Vec2::new(10.5, 0.5), Vec2::new(10.5, 8.5)],
        );
        let summary = walker.run(&mut world, &mut bus, 0.05, 1000);
        assert!(walker.is_finished());
        assert_eq!(summary.waypoints_reached, 2);
        assert_eq!(summary.waypoints_skipped, 0);
        assert!(walker.position().distance(Vec2::new(10.5, 8.5)) <= ARRIVAL_RADIUS);
        assert!((summary.distance - 18.0).abs() < 0.01);
    }

    #[test]
    fn speed_follows_terrain() {
        let mut world = barren_world();
        for x in 0..40 {
            world.chunks_mut().set_tile(TilePos::new(x, 0), TileId::ROAD);
        }
        let mut bus = EventBus::new();
        let mut walker = Walker::new(Vec2::new(0.5, 0.5), vec![Vec2::new(30.5, 0.5)]);
        walker.step(&mut world, &mut bus, 0.1);
        // 10 tiles/s on a 1.25x road tile for 0.1 s.
        assert!((walker.position().x - 1.75).abs() < 1e-4);
    }

    #[test]
    fn walled_in_walker_skips_waypoint() {
        let mut world = barren_world();
        // No door.
        world
            .place_house(TileRect::new(0, 0, 6, 6), IVec2::ZERO, 0, 0.0)
            .unwrap();
        let mut bus = EventBus::new();
        let mut walker = Walker::new(Vec2::new(3.0, 3.0), vec![Vec2::new(20.0, 3.0)]);
        let summary = walker.run(&mut world, &mut bus, 0.1, 500);
        assert!(walker.is_finished());
        assert_eq!(summary.waypoints_skipped, 1);
        assert!(summary.blocked_steps >= STUCK_LIMIT);
        assert!(walker.position().x < 5.0);
    }
}
