use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::world::biome::{BiomeDefinition, BiomeRegistry};

pub const MAX_CHUNK_SIZE: i32 = 1024;

/// Everything the engine needs to build a [`World`](crate::world::World).
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Tiles per chunk edge.
    pub chunk_size: i32,
    /// Pixels per tile. Only drawing uses this.
    pub tile_size_px: i32,
    /// Resident chunk bound for the chunk LRU and the feature cache.
    pub max_cached_chunks: usize,
    pub world_seed: i32,
    pub layer_id: i32,
    pub player_radius_tiles: f32,
    /// Walking speed in tiles per second.
    pub player_speed: f32,
    /// Chunks around the player kept warm, in each direction.
    pub render_distance: i32,
    /// Replaces the standard biome table when present.
    pub biomes: Option<Vec<BiomeDefinition>>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 32,
            tile_size_px: 32,
            max_cached_chunks: 256,
            world_seed: 1_234_567,
            layer_id: 0,
            player_radius_tiles: 0.35,
            player_speed: 10.0,
            render_distance: 3,
            biomes: None,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), WorldError> {
        if !(1..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(WorldError::InvalidConfiguration(format!(
                "chunk_size must be in 1..={}, got {}",
                MAX_CHUNK_SIZE, self.chunk_size
            )));
        }
        if self.max_cached_chunks == 0 {
            return Err(WorldError::InvalidConfiguration(
                "max_cached_chunks must be positive".into(),
            ));
        }
        if !(self.player_radius_tiles.is_finite() && self.player_radius_tiles > 0.0) {
            return Err(WorldError::InvalidConfiguration(format!(
                "player_radius_tiles must be a positive number, got {}",
                self.player_radius_tiles
            )));
        }
        if self.tile_size_px <= 0 {
            return Err(WorldError::InvalidConfiguration(format!(
                "tile_size_px must be positive, got {}",
                self.tile_size_px
            )));
        }
        Ok(())
    }

    /// The configured biome table, or the standard one.
    pub fn biome_registry(&self) -> Result<BiomeRegistry, WorldError> {
        match &self.biomes {
            Some(defs) => BiomeRegistry::from_definitions(defs.clone()),
            None => Ok(BiomeRegistry::standard()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = WorldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.biome_registry().unwrap().spawnable().len(), 2);
    }

    #[test]
    fn bad_values_rejected() {
        let cases = [
            WorldConfig { chunk_size: 0, ..Default::default() },
            WorldConfig { chunk_size: 4096, ..Default::default() },
            WorldConfig { max_cached_chunks: 0, ..Default::default() },
            WorldConfig { player_radius_tiles: -1.0, ..Default::default() },
            WorldConfig { player_radius_tiles: f32::NAN, ..Default::default() },
            WorldConfig { tile_size_px: 0, ..Default::default() },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }
}
