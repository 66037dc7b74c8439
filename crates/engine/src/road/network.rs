use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use glam::Vec2;

use super::{Road, RoadId, RoadSegment};
use crate::world::position::ChunkRange;

/// Every road in the world plus a chunk-keyed index for point queries.
///
/// Buckets are keyed by `(cx, cy)` only: roads are a world-level feature and
/// the network does not distinguish layers.
pub struct RoadNetwork {
    chunk_size: i32,
    roads: BTreeMap<RoadId, Arc<Road>>,
    by_chunk: HashMap<(i32, i32), Vec<RoadId>>,
}

impl RoadNetwork {
    pub fn new(chunk_size: i32) -> Self {
        Self {
            chunk_size,
            roads: BTreeMap::new(),
            by_chunk: HashMap::new(),
        }
    }

    /// Index `road` into every chunk a segment footprint overlaps. A road
    /// with an id that is already present replaces the old one.
    pub fn add_road(&mut self, road: Road) -> Arc<Road> {
        let road = Arc::new(road);
        let id = road.id();
        if self.roads.contains_key(&id) {
            self.remove_road(id);
        }

        for segment in road.segments() {
            let (lo, hi) = segment.footprint(RoadSegment::DEFAULT_TOLERANCE);
            for cell in ChunkRange::covering(lo, hi, self.chunk_size).iter() {
                let bucket = self.by_chunk.entry(cell).or_default();
                if !bucket.contains(&id) {
                    bucket.push(id);
                }
            }
        }

        tracing::debug!(
            "Indexed {} '{}' ({} segments)",
            id,
            road.name(),
            road.segments().len()
        );
        self.roads.insert(id, road.clone());
        road
    }

    /// Drop a road and its index entries. Empty buckets are removed.
    pub fn remove_road(&mut self, id: RoadId) -> Option<Arc<Road>> {
        let road = self.roads.remove(&id)?;
        self.by_chunk.retain(|_, bucket| {
            bucket.retain(|r| *r != id);
            !bucket.is_empty()
        });
        Some(road)
    }

    /// First road in the tile's chunk bucket whose segments contain
    /// `tile_position`, in insertion order. Not necessarily the nearest.
    pub fn road_at(&self, tile_position: Vec2) -> Option<&Arc<Road>> {
        let cx = (tile_position.x / self.chunk_size as f32).floor() as i32;
        let cy = (tile_position.y / self.chunk_size as f32).floor() as i32;
        self.by_chunk
            .get(&(cx, cy))?
            .iter()
            .filter_map(|id| self.roads.get(id))
            .find(|road| {
                road.segments()
                    .iter()
                    .any(|s| s.contains_point_default(tile_position))
            })
    }

    pub fn get(&self, id: RoadId) -> Option<&Arc<Road>> {
        self.roads.get(&id)
    }

    /// All roads, ordered by id.
    pub fn roads(&self) -> impl Iterator<Item = &Arc<Road>> {
        self.roads.values()
    }

    /// Roads indexed into chunk `(cx, cy)`, in insertion order.
    pub fn roads_in_chunk(&self, cx: i32, cy: i32) -> impl Iterator<Item = &Arc<Road>> {
        self.by_chunk
            .get(&(cx, cy))
            .into_iter()
            .flatten()
            .filter_map(|id| self.roads.get(id))
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }
}
