//! Sandbox scenario: engine settings plus the roads and houses placed at
//! startup. Loaded from JSON; with no file the built-in showcase is used.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use tileworld_engine::WorldConfig;
use tileworld_engine::road::{RoadConfig, RoadId, RoadType, RoadWidthSegment};
use tileworld_engine::world::World;
use tileworld_engine::world::position::TileRect;

/// Omitted sections are empty, not the showcase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub roads: Vec<NamedRoad>,
    #[serde(default)]
    pub houses: Vec<HousePlan>,
}

/// A road as authored in the scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRoad {
    pub id: RoadId,
    pub name: String,
    #[serde(default)]
    pub kind: RoadType,
    #[serde(flatten)]
    pub path: RoadConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HousePlan {
    pub bounds: TileRect,
    /// Door offset from the house's top-left tile.
    pub door: IVec2,
    #[serde(default = "default_door_width")]
    pub door_width: i32,
    /// Tiles around the house kept free of procedural features.
    #[serde(default)]
    pub padding: f32,
}

fn default_door_width() -> i32 {
    1
}

impl SandboxConfig {
    /// Read a scenario from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .world
            .validate()
            .with_context(|| format!("validating config {}", path.display()))?;
        Ok(config)
    }

    /// `path` if given, otherwise the showcase scenario.
    pub fn load_or_showcase(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::showcase()),
        }
    }

    /// One walled house near the origin and a long winding dirt road.
    pub fn showcase() -> Self {
        let control_points = [
            (-1750.0, -150.0),
            (-1500.0, -75.0),
            (-1200.0, -25.0),
            (-900.0, 0.0),
            (-600.0, 15.0),
            (-300.0, 25.0),
            (-100.0, 20.0),
            (0.0, 10.0),
            (100.0, 5.0),
            (300.0, 15.0),
            (500.0, 50.0),
            (700.0, 125.0),
            (900.0, 250.0),
            (1100.0, 425.0),
            (1300.0, 650.0),
            (1500.0, 925.0),
            (1700.0, 1250.0),
            (1850.0, 1500.0),
        ]
        .into_iter()
        .map(|(x, y)| Vec2::new(x, y))
        .collect();

        let width_segments = vec![
            RoadWidthSegment::new(0, 3, 3),
            RoadWidthSegment::new(3, 6, 5),
            RoadWidthSegment::new(6, 9, 7),
            RoadWidthSegment::new(9, 12, 4),
            RoadWidthSegment::new(12, 15, 6),
            RoadWidthSegment::new(15, 18, 3),
        ];

        Self {
            world: WorldConfig::default(),
            roads: vec![NamedRoad {
                id: RoadId(1),
                name: "Old Trade Route".into(),
                kind: RoadType::Dirt,
                path: RoadConfig {
                    control_points,
                    width_segments,
                    interpolation_steps: 200,
                },
            }],
            houses: vec![HousePlan {
                bounds: TileRect::new(14, 4, 20, 20),
                door: IVec2::new(3, 19),
                door_width: 1,
                padding: 5.0,
            }],
        }
    }

    /// Build the world and place every house and road in it.
    pub fn build_world(&self) -> Result<World> {
        let mut world = World::new(self.world.clone()).context("creating world")?;
        for house in &self.houses {
            world
                .place_house(house.bounds, house.door, house.door_width, house.padding)
                .with_context(|| format!("placing house at ({}, {})", house.bounds.x, house.bounds.y))?;
        }
        for road in &self.roads {
            world
                .generate_road(road.id, &road.name, &road.path, road.kind)
                .with_context(|| format!("generating road '{}'", road.name))?;
        }
        Ok(world)
    }
}
