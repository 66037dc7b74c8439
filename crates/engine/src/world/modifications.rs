//! Player-caused deviations from the procedural baseline.
//!
//! Procedural trees and rocks are never stored; they are regenerated from the
//! seed whenever needed. This store only records what differs: regions where
//! they must not appear ([`ExclusionZone`]), individual features that are
//! gone, and per-feature state such as "chopped down".
//!
//! Every mutation bumps [`ObjectModificationStore::revision`] and appends the
//! affected chunk region to a bounded change log. Caches of filtered
//! procedural objects replay that log to stay consistent with collision.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::SystemTime;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use super::position::{ChunkKey, ChunkRange, TilePos, TileRect};
use crate::road::Road;

new_key_type! {
    /// Handle returned by [`ObjectModificationStore::add_exclusion_zone`].
    pub struct ZoneId;
}

/// Distance beyond a road's width that still counts as "on the road" for
/// spawn suppression.
pub const ROAD_ZONE_TOLERANCE: f32 = 1.0;

/// Change log entries kept before old ones are dropped. A reader that falls
/// further behind must discard everything it cached.
const CHANGE_LOG_CAPACITY: usize = 1024;

/// Region where procedural features must not spawn.
#[derive(Debug, Clone)]
pub enum ExclusionZone {
    /// Tile rectangle grown by `padding` tiles on every side.
    Rectangular { bounds: TileRect, padding: f32 },
    /// Everything within [`ROAD_ZONE_TOLERANCE`] of the road's surface.
    RoadBased(Arc<Road>),
}

impl ExclusionZone {
    pub fn rectangular(bounds: TileRect, padding: f32) -> Self {
        Self::Rectangular { bounds, padding }
    }

    pub fn road(road: Arc<Road>) -> Self {
        Self::RoadBased(road)
    }

    /// Whether `position` (tile units) lies inside the zone. The rectangle's
    /// low edges are inclusive and its high edges exclusive.
    pub fn contains(&self, position: Vec2) -> bool {
        match self {
            Self::Rectangular { bounds, padding } => {
                position.x >= bounds.x as f32 - padding
                    && position.x < bounds.right() as f32 + padding
                    && position.y >= bounds.y as f32 - padding
                    && position.y < bounds.bottom() as f32 + padding
            }
            Self::RoadBased(road) => road.contains_point(position, ROAD_ZONE_TOLERANCE),
        }
    }

    /// Chunks the zone can touch, or `None` if it covers nothing.
    pub fn chunk_range(&self, chunk_size: i32) -> Option<ChunkRange> {
        match self {
            Self::Rectangular { bounds, padding } => {
                if bounds.is_empty() {
                    return None;
                }
                let lo = Vec2::new(bounds.x as f32, bounds.y as f32) - *padding;
                let hi = Vec2::new(bounds.right() as f32, bounds.bottom() as f32) + *padding;
                Some(ChunkRange::covering(lo, hi, chunk_size))
            }
            Self::RoadBased(road) => road
                .footprint(ROAD_ZONE_TOLERANCE)
                .map(|(lo, hi)| ChunkRange::covering(lo, hi, chunk_size)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcObjectKind {
    Tree,
    Rock,
}

/// Stable identity of a procedural feature: where it grows and what it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcObjectKey {
    pub layer: i32,
    pub chunk_x: i32,
    pub chunk_y: i32,
    pub local_x: u16,
    pub local_y: u16,
    pub kind: ProcObjectKind,
}

impl ProcObjectKey {
    /// Key of a `kind` feature at world tile `tile`.
    pub fn at(layer: i32, tile: TilePos, chunk_size: i32, kind: ProcObjectKind) -> Self {
        let (chunk_x, chunk_y) = tile.chunk(chunk_size);
        let local = tile.local(chunk_size);
        Self {
            layer,
            chunk_x,
            chunk_y,
            local_x: local.x,
            local_y: local.y,
            kind,
        }
    }

    pub fn chunk_key(&self) -> ChunkKey {
        ChunkKey::new(self.layer, self.chunk_x, self.chunk_y)
    }

    /// World tile the feature grows on.
    pub fn tile(&self, chunk_size: i32) -> TilePos {
        let origin = self.chunk_key().origin(chunk_size);
        TilePos::new(
            origin.x.wrapping_add(self.local_x as i32),
            origin.y.wrapping_add(self.local_y as i32),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectState {
    #[default]
    Normal,
    Moved,
    ChoppedDown,
    Destroyed,
    Regrowing,
    Damaged,
}

/// Free-form per-object data (regrowth timers, hit points, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// A player-caused deviation for one procedural feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedObjectRecord {
    pub original_key: ProcObjectKey,
    /// Current position in tile units (differs from the key after a move).
    pub position: Vec2,
    pub state: ObjectState,
    pub modified_at: Option<SystemTime>,
    #[serde(default)]
    pub custom_data: HashMap<String, CustomValue>,
}

impl ModifiedObjectRecord {
    pub fn new(original_key: ProcObjectKey, position: Vec2, state: ObjectState) -> Self {
        Self {
            original_key,
            position,
            state,
            modified_at: Some(SystemTime::now()),
            custom_data: HashMap::new(),
        }
    }
}

/// Region of the world whose filtered procedural objects may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeScope {
    /// A single feature's chunk.
    Chunk(ChunkKey),
    /// A range of chunk coordinates, on every layer.
    Region(ChunkRange),
}

impl ChangeScope {
    pub fn affects(&self, key: ChunkKey) -> bool {
        match self {
            Self::Chunk(k) => *k == key,
            Self::Region(range) => range.contains(key.x, key.y),
        }
    }
}

/// Changes a reader must apply to catch up with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangesSince {
    UpToDate,
    Scopes(Vec<ChangeScope>),
    /// The log no longer reaches back far enough.
    Everything,
}

/// Exclusion zones, deletions and modification records for procedural
/// features. See the module docs.
pub struct ObjectModificationStore {
    chunk_size: i32,
    zones: SlotMap<ZoneId, ExclusionZone>,
    deleted: HashSet<ProcObjectKey>,
    modified: HashMap<ProcObjectKey, ModifiedObjectRecord>,
    revision: u64,
    /// `(revision, scope)` pairs, oldest first.
    log: VecDeque<(u64, ChangeScope)>,
}

impl ObjectModificationStore {
    pub fn new(chunk_size: i32) -> Self {
        Self {
            chunk_size,
            zones: SlotMap::with_key(),
            deleted: HashSet::new(),
            modified: HashMap::new(),
            revision: 0,
            log: VecDeque::new(),
        }
    }

    // ── Exclusion zones ─────────────────────────────────────────────────

    pub fn add_exclusion_zone(&mut self, zone: ExclusionZone) -> ZoneId {
        if let Some(range) = zone.chunk_range(self.chunk_size) {
            self.record(ChangeScope::Region(range));
        }
        self.zones.insert(zone)
    }

    pub fn remove_exclusion_zone(&mut self, id: ZoneId) -> Option<ExclusionZone> {
        let zone = self.zones.remove(id)?;
        if let Some(range) = zone.chunk_range(self.chunk_size) {
            self.record(ChangeScope::Region(range));
        }
        Some(zone)
    }

    /// True if any zone contains `position`.
    pub fn is_in_exclusion_zone(&self, position: Vec2) -> bool {
        self.zones.values().any(|z| z.contains(position))
    }

    pub fn exclusion_zones(&self) -> impl Iterator<Item = (ZoneId, &ExclusionZone)> {
        self.zones.iter()
    }

    // ── Per-object deviations ───────────────────────────────────────────

    /// Mark a feature permanently absent. Drops any modification record.
    pub fn delete_object(&mut self, key: ProcObjectKey) {
        self.modified.remove(&key);
        if self.deleted.insert(key) {
            self.record(ChangeScope::Chunk(key.chunk_key()));
        }
    }

    pub fn is_deleted(&self, key: &ProcObjectKey) -> bool {
        self.deleted.contains(key)
    }

    /// Store or overwrite the record for `key`. Un-deletes the feature.
    pub fn modify_object(&mut self, key: ProcObjectKey, record: ModifiedObjectRecord) {
        if self.deleted.remove(&key) {
            self.record(ChangeScope::Chunk(key.chunk_key()));
        }
        self.modified.insert(key, record);
    }

    pub fn get_modified_object(&self, key: &ProcObjectKey) -> Option<&ModifiedObjectRecord> {
        self.modified.get(key)
    }

    /// Records whose key lies in chunk `(cx, cy)` of `layer`.
    pub fn get_modified_objects_in_chunk(
        &self,
        layer: i32,
        cx: i32,
        cy: i32,
    ) -> Vec<&ModifiedObjectRecord> {
        let chunk = ChunkKey::new(layer, cx, cy);
        self.modified
            .iter()
            .filter(|(key, _)| key.chunk_key() == chunk)
            .map(|(_, record)| record)
            .collect()
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    // ── Change tracking ─────────────────────────────────────────────────

    /// Bumped on every mutation that can change which features are visible.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// What changed after `revision`.
    pub fn changes_since(&self, revision: u64) -> ChangesSince {
        if revision >= self.revision {
            return ChangesSince::UpToDate;
        }
        match self.log.front() {
            Some((oldest, _)) if *oldest <= revision + 1 => ChangesSince::Scopes(
                self.log
                    .iter()
                    .filter(|(rev, _)| *rev > revision)
                    .map(|(_, scope)| *scope)
                    .collect(),
            ),
            _ => ChangesSince::Everything,
        }
    }

    fn record(&mut self, scope: ChangeScope) {
        self.revision += 1;
        if self.log.len() == CHANGE_LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back((self.revision, scope));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: i32, y: i32) -> ProcObjectKey {
        ProcObjectKey::at(0, TilePos::new(x, y), 32, ProcObjectKind::Tree)
    }

    #[test]
    fn key_tile_wraps_past_coordinate_limit() {
        let edge = ProcObjectKey {
            layer: 0,
            chunk_x: 715_827_882,
            chunk_y: 0,
            local_x: 2,
            local_y: 1,
            kind: ProcObjectKind::Rock,
        };
        // Chunk origin is i32::MAX - 1 for a chunk size of 3.
        assert_eq!(edge.tile(3), TilePos::new(i32::MIN, 1));
        assert_eq!(key(i32::MAX, i32::MIN).tile(32), TilePos::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn rectangular_zone_edges() {
        let zone = ExclusionZone::rectangular(TileRect::new(10, 10, 4, 4), 1.0);
        assert!(zone.contains(Vec2::new(9.0, 9.0)));
        assert!(zone.contains(Vec2::new(14.9, 14.9)));
        assert!(!zone.contains(Vec2::new(15.0, 12.0)));
        assert!(!zone.contains(Vec2::new(8.9, 12.0)));
    }

    #[test]
    fn zones_are_or_combined_and_removable() {
        let mut store = ObjectModificationStore::new(32);
        let a = store.add_exclusion_zone(ExclusionZone::rectangular(TileRect::new(0, 0, 2, 2), 0.0));
        store.add_exclusion_zone(ExclusionZone::rectangular(TileRect::new(50, 50, 2, 2), 0.0));
        assert!(store.is_in_exclusion_zone(Vec2::new(1.0, 1.0)));
        assert!(store.is_in_exclusion_zone(Vec2::new(51.0, 51.0)));

        assert!(store.remove_exclusion_zone(a).is_some());
        assert!(!store.is_in_exclusion_zone(Vec2::new(1.0, 1.0)));
        assert!(store.remove_exclusion_zone(a).is_none());
    }

    #[test]
    fn delete_and_modify_are_exclusive() {
        let mut store = ObjectModificationStore::new(32);
        let k = key(3, 4);
        let record = ModifiedObjectRecord::new(k, Vec2::new(3.0, 4.0), ObjectState::ChoppedDown);

        store.modify_object(k, record.clone());
        store.delete_object(k);
        assert!(store.is_deleted(&k));
        assert!(store.get_modified_object(&k).is_none());

        store.modify_object(k, record);
        assert!(!store.is_deleted(&k));
        assert_eq!(
            store.get_modified_object(&k).map(|r| r.state),
            Some(ObjectState::ChoppedDown)
        );
    }

    #[test]
    fn modified_objects_filtered_by_chunk() {
        let mut store = ObjectModificationStore::new(32);
        for (x, y) in [(1, 1), (5, 5), (-1, -1)] {
            let k = key(x, y);
            store.modify_object(k, ModifiedObjectRecord::new(k, k.tile(32).corner(), ObjectState::Damaged));
        }
        assert_eq!(store.get_modified_objects_in_chunk(0, 0, 0).len(), 2);
        assert_eq!(store.get_modified_objects_in_chunk(0, -1, -1).len(), 1);
        assert!(store.get_modified_objects_in_chunk(1, 0, 0).is_empty());
    }

    #[test]
    fn key_roundtrips_negative_tiles() {
        let k = key(-1, -33);
        assert_eq!((k.chunk_x, k.chunk_y, k.local_x, k.local_y), (-1, -2, 31, 31));
        assert_eq!(k.tile(32), TilePos::new(-1, -33));
    }

    #[test]
    fn changes_are_logged_per_mutation() {
        let mut store = ObjectModificationStore::new(32);
        assert_eq!(store.changes_since(0), ChangesSince::UpToDate);

        store.delete_object(key(40, 1));
        store.delete_object(key(40, 1));
        assert_eq!(store.revision(), 1);
        assert_eq!(
            store.changes_since(0),
            ChangesSince::Scopes(vec![ChangeScope::Chunk(ChunkKey::new(0, 1, 0))])
        );

        store.add_exclusion_zone(ExclusionZone::rectangular(TileRect::new(0, 0, 40, 4), 0.0));
        match store.changes_since(1) {
            ChangesSince::Scopes(scopes) => {
                assert_eq!(scopes, vec![ChangeScope::Region(ChunkRange::new(0, 0, 1, 0))]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stale_reader_gets_everything() {
        let mut store = ObjectModificationStore::new(32);
        for i in 0..(CHANGE_LOG_CAPACITY as i32 + 5) {
            store.delete_object(key(i, 0));
        }
        assert_eq!(store.changes_since(0), ChangesSince::Everything);
        assert!(matches!(
            store.changes_since(store.revision() - 3),
            ChangesSince::Scopes(s) if s.len() == 3
        ));
    }
}
