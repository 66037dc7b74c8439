use std::fmt;
use std::io::{Read, Write};

use super::biome::BiomeId;
use super::position::{ChunkKey, LocalTilePos};
use super::tile::TileId;
use crate::error::ChunkFormatError;

/// Version byte written at the start of every persisted chunk.
pub const CHUNK_FORMAT_VERSION: u8 = 1;

/// Opaque render resource a renderer attaches to a chunk (a baked texture,
/// a GPU buffer, ...). The engine never looks inside; it only releases it when
/// the chunk is evicted or unbaked.
///
/// `Send` so a worker thread can build the resource from the chunk's terrain
/// and hand it back to the owning thread for attachment.
pub trait RenderHandle: Send {
    /// Free the underlying resource. Called exactly once, right before drop.
    fn release(&mut self) {}
}

/// A square grid of terrain tiles: the unit of world storage and generation.
///
/// Terrain is row-major and always `chunk_size * chunk_size` long.
pub struct Chunk {
    key: ChunkKey,
    biome: BiomeId,
    edge: i32,
    terrain: Box<[TileId]>,
    /// Lazily attached by the renderer; never serialized.
    render_cache: Option<Box<dyn RenderHandle>>,
    /// Terrain edited after generation.
    modified: bool,
}

impl Chunk {
    /// A chunk of `biome` with every tile set to `fill`.
    pub fn filled(key: ChunkKey, biome: BiomeId, edge: i32, fill: TileId) -> Self {
        let len = (edge as usize) * (edge as usize);
        Self {
            key,
            biome,
            edge,
            terrain: vec![fill; len].into_boxed_slice(),
            render_cache: None,
            modified: false,
        }
    }

    pub(crate) fn with_terrain(key: ChunkKey, biome: BiomeId, edge: i32, terrain: Box<[TileId]>) -> Self {
        debug_assert_eq!(terrain.len(), (edge as usize) * (edge as usize));
        Self {
            key,
            biome,
            edge,
            terrain,
            render_cache: None,
            modified: false,
        }
    }

    pub fn key(&self) -> ChunkKey {
        self.key
    }

    pub fn biome(&self) -> BiomeId {
        self.biome
    }

    /// Tiles per chunk edge.
    pub fn edge(&self) -> i32 {
        self.edge
    }

    pub fn terrain(&self) -> &[TileId] {
        &self.terrain
    }

    #[inline]
    pub fn tile(&self, pos: LocalTilePos) -> TileId {
        self.terrain
            .get(pos.index(self.edge))
            .copied()
            .unwrap_or(TileId::VOID)
    }

    /// Overwrite one tile and mark the chunk modified. Out-of-range positions
    /// are ignored. Any attached render cache is stale afterwards and is dropped.
    ///
    /// Returns whether the tile actually changed.
    pub fn set_tile(&mut self, pos: LocalTilePos, tile: TileId) -> bool {
        if pos.x as i32 >= self.edge || pos.y as i32 >= self.edge {
            return false;
        }
        let idx = pos.index(self.edge);
        if self.terrain[idx] == tile {
            return false;
        }
        self.terrain[idx] = tile;
        self.modified = true;
        self.unbake();
        true
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn mark_modified(&mut self) {
        self.modified = true;
    }

    // ── Render cache ────────────────────────────────────────────────────

    pub fn is_baked(&self) -> bool {
        self.render_cache.is_some()
    }

    pub fn render_cache(&self) -> Option<&dyn RenderHandle> {
        self.render_cache.as_deref()
    }

    /// Attach a render resource, releasing any previous one.
    pub fn attach_render_cache(&mut self, handle: Box<dyn RenderHandle>) {
        self.unbake();
        self.render_cache = Some(handle);
    }

    /// Release and drop the render resource, if any.
    pub fn unbake(&mut self) {
        if let Some(mut handle) = self.render_cache.take() {
            handle.release();
        }
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Write the chunk as `version, layer, x, y, biome, edge, terrain`.
    /// Integers are little-endian. The render cache is not written.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&[CHUNK_FORMAT_VERSION])?;
        w.write_all(&self.key.layer.to_le_bytes())?;
        w.write_all(&self.key.x.to_le_bytes())?;
        w.write_all(&self.key.y.to_le_bytes())?;
        w.write_all(&[self.biome.0])?;
        w.write_all(&(self.edge as u16).to_le_bytes())?;
        let bytes: Vec<u8> = self.terrain.iter().map(|t| t.0).collect();
        w.write_all(&bytes)
    }

    /// Read a chunk written by [`Chunk::write_to`]. The edge stored in the
    /// data must equal `expected_edge`.
    pub fn read_from<R: Read>(r: &mut R, expected_edge: i32) -> Result<Self, ChunkFormatError> {
        let version = read_array::<_, 1>(r)?[0];
        if version != CHUNK_FORMAT_VERSION {
            return Err(ChunkFormatError::UnsupportedVersion {
                found: version,
                expected: CHUNK_FORMAT_VERSION,
            });
        }
        let layer = i32::from_le_bytes(read_array(r)?);
        let x = i32::from_le_bytes(read_array(r)?);
        let y = i32::from_le_bytes(read_array(r)?);
        let biome = BiomeId(read_array::<_, 1>(r)?[0]);
        let edge = u16::from_le_bytes(read_array(r)?);
        if edge as i32 != expected_edge {
            return Err(ChunkFormatError::EdgeMismatch {
                found: edge,
                expected: expected_edge as u16,
            });
        }

        let len = edge as usize * edge as usize;
        let mut bytes = Vec::with_capacity(len);
        r.take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != len {
            return Err(ChunkFormatError::Truncated {
                expected: len,
                found: bytes.len(),
            });
        }
        let terrain = bytes.into_iter().map(TileId).collect();
        Ok(Self::with_terrain(ChunkKey::new(layer, x, y), biome, edge as i32, terrain))
    }
}

fn read_array<R: Read, const N: usize>(r: &mut R) -> Result<[u8; N], ChunkFormatError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("key", &self.key)
            .field("biome", &self.biome)
            .field("edge", &self.edge)
            .field("baked", &self.is_baked())
            .field("modified", &self.modified)
            .finish()
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        self.unbake();
    }
}
