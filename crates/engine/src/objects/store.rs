use std::collections::HashMap;

use super::{ObjectId, SizeCategory, WorldObject};
use crate::error::WorldError;
use crate::world::position::{ChunkKey, ChunkRange, TilePos};

/// Owns every explicitly placed object and indexes it by chunk.
///
/// An object is listed in the bucket of every chunk its bounds overlap, so a
/// house straddling a chunk border is found from either side. Massive objects
/// skip the grid and are scanned linearly.
pub struct WorldObjectStore {
    chunk_size: i32,
    objects: HashMap<ObjectId, WorldObject>,
    grid: HashMap<ChunkKey, Vec<ObjectId>>,
    massive: Vec<ObjectId>,
    next_id: u64,
}

impl WorldObjectStore {
    pub fn new(chunk_size: i32) -> Self {
        Self {
            chunk_size,
            objects: HashMap::new(),
            grid: HashMap::new(),
            massive: Vec::new(),
            next_id: 1,
        }
    }

    /// A fresh id. Ids increase monotonically and are never handed out twice.
    pub fn new_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Store `object` and index it. Fails on the procedural id, an id that
    /// is already stored, or bounds whose far edge overflows `i32`.
    pub fn add(&mut self, object: WorldObject) -> Result<ObjectId, WorldError> {
        let id = object.id();
        if id == ObjectId::PROCEDURAL {
            return Err(WorldError::ReservedObjectId);
        }
        if self.objects.contains_key(&id) {
            return Err(WorldError::DuplicateObjectId(id));
        }
        let bounds = object.bounds();
        if !bounds.fits() {
            return Err(WorldError::InvalidConfiguration(format!(
                "object {} at ({}, {}) extends past the tile coordinate range",
                id, bounds.x, bounds.y
            )));
        }
        // Ids chosen by the caller must not be handed out later.
        self.next_id = self.next_id.max(id.0 + 1);

        if object.size_category() == SizeCategory::Massive {
            self.massive.push(id);
        } else if let Some(range) = self.chunk_range(&object) {
            for (cx, cy) in range.iter() {
                self.grid
                    .entry(ChunkKey::new(object.layer(), cx, cy))
                    .or_default()
                    .push(id);
            }
        }
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Remove an object from storage and from every bucket it was in.
    pub fn remove(&mut self, id: ObjectId) -> Option<WorldObject> {
        let object = self.objects.remove(&id)?;
        if object.size_category() == SizeCategory::Massive {
            self.massive.retain(|m| *m != id);
        } else if let Some(range) = self.chunk_range(&object) {
            for (cx, cy) in range.iter() {
                let key = ChunkKey::new(object.layer(), cx, cy);
                if let Some(bucket) = self.grid.get_mut(&key) {
                    bucket.retain(|o| *o != id);
                    if bucket.is_empty() {
                        self.grid.remove(&key);
                    }
                }
            }
        }
        Some(object)
    }

    pub fn get(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.get(&id)
    }

    /// Objects overlapping chunk `(cx, cy)` of `layer`: the chunk's bucket in
    /// insertion order, then any massive objects that reach into it.
    pub fn query_by_chunk(&self, layer: i32, cx: i32, cy: i32) -> Vec<&WorldObject> {
        let key = ChunkKey::new(layer, cx, cy);
        let bucketed = self
            .grid
            .get(&key)
            .into_iter()
            .flatten()
            .filter_map(|id| self.objects.get(id));
        let massive = self.massive_on_layer(layer).filter(|o| {
            self.chunk_range(o)
                .is_some_and(|range| range.contains(cx, cy))
        });
        bucketed.chain(massive).collect()
    }

    /// Whether any stored object on `layer` is solid at tile `(x, y)`.
    pub fn is_solid_tile(&self, layer: i32, x: i32, y: i32) -> bool {
        let (cx, cy) = TilePos::new(x, y).chunk(self.chunk_size);
        let in_bucket = self
            .grid
            .get(&ChunkKey::new(layer, cx, cy))
            .is_some_and(|bucket| {
                bucket
                    .iter()
                    .filter_map(|id| self.objects.get(id))
                    .any(|o| o.is_solid_tile(x, y))
            });
        in_bucket || self.massive_on_layer(layer).any(|o| o.is_solid_tile(x, y))
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of non-empty chunk buckets.
    pub fn bucket_count(&self) -> usize {
        self.grid.len()
    }

    fn massive_on_layer(&self, layer: i32) -> impl Iterator<Item = &WorldObject> {
        self.massive
            .iter()
            .filter_map(|id| self.objects.get(id))
            .filter(move |o| o.layer() == layer)
    }

    fn chunk_range(&self, object: &WorldObject) -> Option<ChunkRange> {
        object.bounds().chunk_range(self.chunk_size)
    }
}
