//! Saving and loading edited chunks.
//!
//! Each dirty chunk is written to `<dir>/chunks/c.<layer>.<x>.<y>.chunk.gz`
//! as a gzip-compressed chunk record. Unedited chunks are never saved; they
//! regenerate from the seed. Loading installs every saved chunk of the
//! world's layer over whatever the generator would produce.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use tileworld_engine::world::World;
use tileworld_engine::world::chunk::Chunk;
use tileworld_engine::world::position::ChunkKey;

const CHUNK_DIR: &str = "chunks";
const CHUNK_SUFFIX: &str = ".chunk.gz";

fn chunk_file_name(key: ChunkKey) -> String {
    format!("c.{}.{}.{}{}", key.layer, key.x, key.y, CHUNK_SUFFIX)
}

/// Parse `c.L.X.Y.chunk.gz` back into a key.
fn parse_chunk_file_name(name: &str) -> Option<ChunkKey> {
    let stem = name.strip_suffix(CHUNK_SUFFIX)?.strip_prefix("c.")?;
    let mut parts = stem.split('.');
    let layer = parts.next()?.parse().ok()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ChunkKey::new(layer, x, y))
}

// ── Save ─────────────────────────────────────────────────────────────────────

/// Write every chunk edited since the last save. Returns the number written.
pub fn save_dirty(world: &mut World, dir: &Path) -> Result<usize> {
    let dirty = world.chunks_mut().take_dirty_chunks();
    if dirty.is_empty() {
        tracing::info!("World save: nothing to save (no dirty chunks)");
        return Ok(0);
    }

    let start = Instant::now();
    let chunk_dir = dir.join(CHUNK_DIR);
    fs::create_dir_all(&chunk_dir)
        .with_context(|| format!("creating {}", chunk_dir.display()))?;

    let mut written = 0usize;
    for key in &dirty {
        let Some(chunk) = world.chunks().export_chunk(*key) else {
            continue;
        };
        let path = chunk_dir.join(chunk_file_name(*key));
        write_chunk_file(&path, chunk).with_context(|| format!("saving chunk {}", key))?;
        written += 1;
    }

    tracing::info!(
        "World saved: {} dirty chunks to {} ({:.2?})",
        written,
        chunk_dir.display(),
        start.elapsed(),
    );
    Ok(written)
}

/// Write through a temporary file so a crash never leaves a torn chunk.
fn write_chunk_file(path: &Path, chunk: &Chunk) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    chunk
        .write_to(&mut encoder)
        .with_context(|| format!("encoding {}", tmp.display()))?;
    encoder
        .finish()
        .and_then(|mut w| w.flush())
        .with_context(|| format!("flushing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
    Ok(())
}

// ── Load ─────────────────────────────────────────────────────────────────────

/// Install every saved chunk of the world's layer found under `dir`.
///
/// Unreadable or foreign files are skipped with a warning. Returns the number
/// of chunks loaded; a missing directory loads nothing.
pub fn load_into(world: &mut World, dir: &Path) -> Result<usize> {
    let chunk_dir = dir.join(CHUNK_DIR);
    if !chunk_dir.is_dir() {
        return Ok(0);
    }

    let start = Instant::now();
    let layer = world.layer();
    let edge = world.chunk_size();
    let mut loaded = 0usize;

    let entries = fs::read_dir(&chunk_dir)
        .with_context(|| format!("listing {}", chunk_dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("listing {}", chunk_dir.display()))?
            .path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(key) = parse_chunk_file_name(name) else {
            tracing::warn!("Skipping unexpected file in chunk dir: {}", name);
            continue;
        };
        if key.layer != layer {
            continue;
        }

        let chunk = match read_chunk_file(&path, edge) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!("Skipping unreadable chunk file {}: {:#}", name, e);
                continue;
            }
        };
        if chunk.key() != key {
            tracing::warn!(
                "Skipping {}: file holds chunk {} instead of {}",
                name,
                chunk.key(),
                key
            );
            continue;
        }
        world
            .restore_chunk(chunk)
            .with_context(|| format!("installing chunk {}", key))?;
        loaded += 1;
    }

    if loaded > 0 {
        tracing::info!(
            "World loaded: {} chunks from {} ({:.2?})",
            loaded,
            chunk_dir.display(),
            start.elapsed(),
        );
    }
    Ok(loaded)
}

fn read_chunk_file(path: &Path, edge: i32) -> Result<Chunk> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let chunk = Chunk::read_from(&mut decoder, edge)
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(chunk)
}

// ── Tests ────────────────────────────────────────────────────────────────────
