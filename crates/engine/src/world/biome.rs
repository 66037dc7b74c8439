//! Biome definitions and the read-only registry that maps ids to spawn rates.
//!
//! The registry is built once (usually [`BiomeRegistry::standard`]) and shared
//! behind an `Arc` by every component that needs it. Tests build synthetic
//! tables with [`BiomeRegistry::from_definitions`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::tile::TileId;
use crate::error::WorldError;

/// Spawn chances are expressed out of this many.
pub const CHANCE_SCALE: u16 = 1024;

/// Opaque biome identifier as stored in a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BiomeId(pub u8);

impl BiomeId {
    /// The fallback biome: no features ever spawn.
    pub const NONE: BiomeId = BiomeId(0);
    pub const GRASSY_PLAIN: BiomeId = BiomeId(1);
    pub const DESERT: BiomeId = BiomeId(2);
}

/// Per-biome terrain fill and feature spawn rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomeDefinition {
    pub id: BiomeId,
    pub name: String,
    /// Tile every chunk of this biome is filled with.
    pub base_tile: TileId,
    /// Boulder chance out of [`CHANCE_SCALE`].
    pub boulder_chance: u16,
    /// Tree chance out of [`CHANCE_SCALE`].
    pub tree_chance: u16,
    /// Whether the chunk manager may pick this biome for new chunks.
    #[serde(default = "default_spawnable")]
    pub spawnable: bool,
}

fn default_spawnable() -> bool {
    true
}

impl BiomeDefinition {
    pub fn new(id: BiomeId, name: impl Into<String>, base_tile: TileId) -> Self {
        Self {
            id,
            name: name.into(),
            base_tile,
            boulder_chance: 0,
            tree_chance: 0,
            spawnable: true,
        }
    }

    pub fn with_chances(mut self, boulder: u16, tree: u16) -> Self {
        self.boulder_chance = boulder;
        self.tree_chance = tree;
        self
    }

    pub fn not_spawnable(mut self) -> Self {
        self.spawnable = false;
        self
    }

    /// The "None" biome: void tiles, zero spawn chances, never picked.
    pub fn none() -> Self {
        Self::new(BiomeId::NONE, "None", TileId::VOID).not_spawnable()
    }
}

/// Read-only mapping from [`BiomeId`] to [`BiomeDefinition`].
#[derive(Debug, Clone)]
pub struct BiomeRegistry {
    by_id: HashMap<BiomeId, BiomeDefinition>,
    /// Ids eligible for new chunks, in registration order.
    spawnable: Vec<BiomeId>,
    none: BiomeDefinition,
}

impl BiomeRegistry {
    /// None, GrassyPlain and Desert.
    pub fn standard() -> Self {
        let defs = vec![
            BiomeDefinition::none(),
            BiomeDefinition::new(BiomeId::GRASSY_PLAIN, "GrassyPlain", TileId::GRASS)
                .with_chances(16, 8),
            BiomeDefinition::new(BiomeId::DESERT, "Desert", TileId::SAND).with_chances(10, 5),
        ];
        // The standard table is known-valid.
        Self::build(defs)
    }

    /// Build a registry from an explicit table.
    ///
    /// Fails if ids repeat or if no biome is spawnable (the chunk manager
    /// would have nothing to pick from).
    pub fn from_definitions(defs: Vec<BiomeDefinition>) -> Result<Self, WorldError> {
        let mut seen = std::collections::HashSet::new();
        for def in &defs {
            if !seen.insert(def.id) {
                return Err(WorldError::InvalidConfiguration(format!(
                    "biome id {} defined twice",
                    def.id.0
                )));
            }
        }
        if !defs.iter().any(|d| d.spawnable && d.id != BiomeId::NONE) {
            return Err(WorldError::InvalidConfiguration(
                "biome table has no spawnable biome".into(),
            ));
        }
        Ok(Self::build(defs))
    }

    fn build(defs: Vec<BiomeDefinition>) -> Self {
        let mut by_id = HashMap::with_capacity(defs.len());
        let mut spawnable = Vec::new();
        let mut none = BiomeDefinition::none();
        for def in defs {
            if def.id == BiomeId::NONE {
                none = def.clone();
            } else if def.spawnable {
                spawnable.push(def.id);
            }
            by_id.insert(def.id, def);
        }
        Self { by_id, spawnable, none }
    }

    /// Definition for `id`, or the "None" biome for unknown ids.
    pub fn get(&self, id: BiomeId) -> &BiomeDefinition {
        match self.by_id.get(&id) {
            Some(def) => def,
            None => {
                tracing::debug!("Unknown biome id {}, using None", id.0);
                &self.none
            }
        }
    }

    /// Biomes new chunks are chosen from, in registration order.
    pub fn spawnable(&self) -> &[BiomeId] {
        &self.spawnable
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for BiomeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
