use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Road, RoadId, RoadNetwork, RoadSegment, RoadType};
use crate::error::WorldError;
use crate::world::chunk_manager::ChunkManager;
use crate::world::position::TilePos;
use crate::world::tile::TileId;

/// Width used for spans no width segment covers.
pub const DEFAULT_ROAD_WIDTH: i32 = 4;
pub const MIN_ROAD_WIDTH: i32 = 1;
pub const MAX_ROAD_WIDTH: i32 = 10;
/// Minimum path distance between recorded segment endpoints.
pub const SEGMENT_SPACING: f32 = 5.0;

/// Width override for control-point spans `start_index..end_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadWidthSegment {
    pub start_index: usize,
    pub end_index: usize,
    pub width: i32,
}

impl RoadWidthSegment {
    pub const fn new(start_index: usize, end_index: usize, width: i32) -> Self {
        Self {
            start_index,
            end_index,
            width,
        }
    }

    fn covers(&self, span: usize) -> bool {
        span >= self.start_index && span < self.end_index
    }
}

/// Authoring input for one road.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    /// Catmull-Rom control points in tile units. At least four.
    pub control_points: Vec<Vec2>,
    /// First matching entry wins.
    pub width_segments: Vec<RoadWidthSegment>,
    /// Samples per control-point span.
    pub interpolation_steps: u32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            control_points: Vec::new(),
            width_segments: Vec::new(),
            interpolation_steps: 200,
        }
    }
}

impl RoadConfig {
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.control_points.len() < 4 {
            return Err(WorldError::InvalidConfiguration(format!(
                "road needs at least 4 control points, got {}",
                self.control_points.len()
            )));
        }
        if self.interpolation_steps == 0 {
            return Err(WorldError::InvalidConfiguration(
                "road interpolation_steps must be positive".into(),
            ));
        }
        if let Some(p) = self.control_points.iter().find(|p| !p.is_finite()) {
            return Err(WorldError::InvalidConfiguration(format!(
                "road control point {p} is not finite"
            )));
        }
        Ok(())
    }

    fn base_width(&self, span: usize) -> i32 {
        self.width_segments
            .iter()
            .find(|w| w.covers(span))
            .map_or(DEFAULT_ROAD_WIDTH, |w| w.width)
    }
}

/// One point of the sampled centerline with the brush radius used there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSample {
    pub tile: TilePos,
    pub width: i32,
}

/// Sample the smoothed centerline of `config` without touching the world.
///
/// Span `i` runs from control point `i` to `i + 1` and uses points `i - 1`
/// and `i + 2` as tangents, so the first and last control points are never
/// reached.
pub fn sample_path(config: &RoadConfig) -> Result<Vec<PathSample>, WorldError> {
    config.validate()?;
    let pts = &config.control_points;
    let steps = config.interpolation_steps;
    let mut path = Vec::with_capacity((pts.len() - 3) * steps as usize);

    for i in 1..pts.len() - 2 {
        let base = config.base_width(i);
        for step in 0..steps {
            let t = step as f32 / steps as f32;
            let p = catmull_rom(pts[i - 1], pts[i], pts[i + 1], pts[i + 2], t);
            let wobble = (step as f32 * 0.05).sin().round() as i32;
            path.push(PathSample {
                tile: TilePos::new(p.x.round_ties_even() as i32, p.y.round_ties_even() as i32),
                width: (base + wobble).clamp(MIN_ROAD_WIDTH, MAX_ROAD_WIDTH),
            });
        }
    }
    Ok(path)
}

fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// Build a road from `config`, stamp it into `chunks` and index it in
/// `network`.
///
/// The config is fully validated before the first tile is written, so a
/// rejected config leaves the world untouched.
pub fn generate_road(
    chunks: &mut ChunkManager,
    network: &mut RoadNetwork,
    id: RoadId,
    name: &str,
    config: &RoadConfig,
    kind: RoadType,
    layer: i32,
) -> Result<Arc<Road>, WorldError> {
    if layer != chunks.layer() {
        return Err(WorldError::InvalidConfiguration(format!(
            "road {} targets layer {} but the chunk manager owns layer {}",
            id,
            layer,
            chunks.layer()
        )));
    }
    let path = sample_path(config)?;

    let mut segments = Vec::new();
    let mut last: Option<Vec2> = None;
    let mut stamped = 0usize;
    for sample in &path {
        stamped += stamp_brush(chunks, sample.tile, sample.width);

        let current = sample.tile.corner();
        match last {
            None => last = Some(current),
            Some(prev) if prev.distance(current) >= SEGMENT_SPACING => {
                segments.push(RoadSegment::new(prev, current, sample.width as f32));
                last = Some(current);
            }
            Some(_) => {}
        }
    }

    let road = Road::new(id, name, kind, config.control_points.clone(), segments);
    let road = network.add_road(road);
    tracing::info!(
        "Generated {} '{}': {} samples, {} segments, {} tiles changed",
        id,
        name,
        path.len(),
        road.segments().len(),
        stamped
    );
    Ok(road)
}

/// Paint a filled circle of road tiles; returns how many tiles changed.
fn stamp_brush(chunks: &mut ChunkManager, center: TilePos, width: i32) -> usize {
    let mut changed = 0;
    for dy in -width..=width {
        for dx in -width..=width {
            if dx * dx + dy * dy > width * width {
                continue;
            }
            let tile = TilePos::new(center.x.wrapping_add(dx), center.y.wrapping_add(dy));
            if chunks.set_tile(tile, TileId::ROAD) {
                changed += 1;
            }
        }
    }
    changed
}
