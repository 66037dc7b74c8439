//! Hand-authored roads: the immutable [`Road`] model, its segment-level
//! geometry, the per-chunk [`RoadNetwork`] index, and the spline generator
//! that stamps roads into terrain.

pub mod generator;
pub mod network;

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use generator::{PathSample, RoadConfig, RoadWidthSegment, generate_road, sample_path};
pub use network::RoadNetwork;

/// Identifier chosen by whoever authors the road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoadId(pub u32);

impl fmt::Display for RoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "road#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoadType {
    #[default]
    Dirt,
    Gravel,
    Paved,
    Highway,
}

/// Straight piece of a road's centerline, in tile units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadSegment {
    pub start: Vec2,
    pub end: Vec2,
    /// Half-extent of the road around the centerline, in tiles.
    pub width: f32,
}

impl RoadSegment {
    /// Slack added to `width` by [`RoadSegment::contains_point_default`].
    pub const DEFAULT_TOLERANCE: f32 = 0.5;

    pub fn new(start: Vec2, end: Vec2, width: f32) -> Self {
        Self { start, end, width }
    }

    pub fn center(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    /// Shortest distance from `point` to the segment (not the infinite line).
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let v = self.end - self.start;
        let w = point - self.start;

        let c1 = w.dot(v);
        if c1 <= 0.0 {
            return point.distance(self.start);
        }
        let c2 = v.dot(v);
        if c1 >= c2 {
            return point.distance(self.end);
        }
        point.distance(self.start + v * (c1 / c2))
    }

    pub fn contains_point(&self, point: Vec2, tolerance: f32) -> bool {
        self.distance_to(point) <= self.width + tolerance
    }

    pub fn contains_point_default(&self, point: Vec2) -> bool {
        self.contains_point(point, Self::DEFAULT_TOLERANCE)
    }

    /// Axis-aligned box around the segment's footprint, grown by `slack`.
    pub fn footprint(&self, slack: f32) -> (Vec2, Vec2) {
        let pad = Vec2::splat(self.width + slack);
        (self.start.min(self.end) - pad, self.start.max(self.end) + pad)
    }
}

/// A named road. Built once by the generator and never edited afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    id: RoadId,
    name: String,
    kind: RoadType,
    control_points: Vec<Vec2>,
    segments: Vec<RoadSegment>,
}

impl Road {
    pub fn new(
        id: RoadId,
        name: impl Into<String>,
        kind: RoadType,
        control_points: Vec<Vec2>,
        segments: Vec<RoadSegment>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            control_points,
            segments,
        }
    }

    pub fn id(&self) -> RoadId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RoadType {
        self.kind
    }

    pub fn control_points(&self) -> &[Vec2] {
        &self.control_points
    }

    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    pub fn contains_point(&self, point: Vec2, tolerance: f32) -> bool {
        self.segments.iter().any(|s| s.contains_point(point, tolerance))
    }

    /// Closest segment endpoint or center to `position`.
    ///
    /// Resolution is the segment spacing, which is enough for an NPC to steer
    /// towards. A road without segments returns `position` unchanged.
    pub fn nearest_point(&self, position: Vec2) -> Vec2 {
        self.segments
            .iter()
            .flat_map(|s| [s.start, s.center(), s.end])
            .min_by(|a, b| {
                position
                    .distance_squared(*a)
                    .total_cmp(&position.distance_squared(*b))
            })
            .unwrap_or(position)
    }

    /// Unit direction of the segment closest to `position`, or zero for a
    /// road without segments.
    pub fn direction_at(&self, position: Vec2) -> Vec2 {
        self.segments
            .iter()
            .min_by(|a, b| a.distance_to(position).total_cmp(&b.distance_to(position)))
            .map(|s| (s.end - s.start).normalize_or_zero())
            .unwrap_or(Vec2::ZERO)
    }

    /// Box around every segment footprint grown by `slack`, or `None` for a
    /// road without segments.
    pub fn footprint(&self, slack: f32) -> Option<(Vec2, Vec2)> {
        self.segments
            .iter()
            .map(|s| s.footprint(slack))
            .reduce(|(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal() -> RoadSegment {
        RoadSegment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 2.0)
    }

    #[test]
    fn distance_clamps_to_endpoints() {
        let s = horizontal();
        assert_eq!(s.distance_to(Vec2::new(5.0, 3.0)), 3.0);
        assert_eq!(s.distance_to(Vec2::new(-3.0, 4.0)), 5.0);
        assert_eq!(s.distance_to(Vec2::new(13.0, -4.0)), 5.0);
    }

    #[test]
    fn degenerate_segment_measures_from_start() {
        let s = RoadSegment::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0), 1.0);
        assert_eq!(s.distance_to(Vec2::new(4.0, 5.0)), 5.0);
    }

    #[test]
    fn containment_uses_width_plus_tolerance() {
        let s = horizontal();
        assert!(s.contains_point_default(Vec2::new(5.0, 2.5)));
        assert!(!s.contains_point_default(Vec2::new(5.0, 2.6)));
        assert!(s.contains_point(Vec2::new(5.0, 2.9), 1.0));
    }

    #[test]
    fn nearest_point_and_direction() {
        let road = Road::new(
            RoadId(1),
            "test",
            RoadType::Dirt,
            Vec::new(),
            vec![
                horizontal(),
                RoadSegment::new(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0), 2.0),
            ],
        );
        assert_eq!(road.nearest_point(Vec2::new(4.0, 1.0)), Vec2::new(5.0, 0.0));
        assert_eq!(road.direction_at(Vec2::new(3.0, 1.0)), Vec2::X);
        assert_eq!(road.direction_at(Vec2::new(11.0, 8.0)), Vec2::Y);
    }

    #[test]
    fn empty_road_degrades_gracefully() {
        let road = Road::new(RoadId(2), "empty", RoadType::Paved, Vec::new(), Vec::new());
        let p = Vec2::new(3.0, 4.0);
        assert_eq!(road.nearest_point(p), p);
        assert_eq!(road.direction_at(p), Vec2::ZERO);
        assert!(road.footprint(1.0).is_none());
        assert!(!road.contains_point(p, 100.0));
    }

    #[test]
    fn footprint_includes_width() {
        let (lo, hi) = horizontal().footprint(0.5);
        assert_eq!(lo, Vec2::new(-2.5, -2.5));
        assert_eq!(hi, Vec2::new(12.5, 2.5));
    }
}
