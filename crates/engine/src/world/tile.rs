use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Terrain kind stored per tile in a chunk. The engine only interprets the
/// ids listed here; hosts may register more in a [`TileRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileId(pub u8);

impl TileId {
    pub const VOID: TileId = TileId(0);
    pub const GRASS: TileId = TileId(1);
    pub const SAND: TileId = TileId(2);
    pub const ROCKY: TileId = TileId(3);
    /// Stamped by the road generator.
    pub const ROAD: TileId = TileId(4);
}

/// Static properties of a terrain kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    pub id: TileId,
    pub name: String,
    /// Multiplier applied to walking speed on this tile.
    pub movement_speed: f32,
}

impl TileDefinition {
    pub fn new(id: TileId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            movement_speed: 1.0,
        }
    }

    pub fn with_movement_speed(mut self, speed: f32) -> Self {
        self.movement_speed = speed;
        self
    }
}

/// Lookup table from [`TileId`] to its definition.
#[derive(Debug, Clone, Default)]
pub struct TileRegistry {
    tiles: HashMap<TileId, TileDefinition>,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in terrain kinds.
    pub fn standard() -> Self {
        let mut reg = Self::new();
        reg.register(TileDefinition::new(TileId::VOID, "void"));
        reg.register(TileDefinition::new(TileId::GRASS, "grass"));
        reg.register(TileDefinition::new(TileId::SAND, "sand").with_movement_speed(0.85));
        reg.register(TileDefinition::new(TileId::ROCKY, "rocky").with_movement_speed(0.9));
        reg.register(TileDefinition::new(TileId::ROAD, "road").with_movement_speed(1.25));
        reg
    }

    /// Insert or replace a definition.
    pub fn register(&mut self, tile: TileDefinition) {
        self.tiles.insert(tile.id, tile);
    }

    pub fn get(&self, id: TileId) -> Option<&TileDefinition> {
        self.tiles.get(&id)
    }

    /// Speed multiplier for `id`; unregistered tiles walk at normal speed.
    pub fn movement_speed(&self, id: TileId) -> f32 {
        self.get(id).map_or(1.0, |t| t.movement_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_knows_road() {
        let reg = TileRegistry::standard();
        assert_eq!(reg.get(TileId::ROAD).map(|t| t.name.as_str()), Some("road"));
        assert!(reg.movement_speed(TileId::ROAD) > reg.movement_speed(TileId::GRASS));
    }

    #[test]
    fn unknown_tile_walks_at_normal_speed() {
        let reg = TileRegistry::standard();
        assert_eq!(reg.movement_speed(TileId(200)), 1.0);
        assert!(reg.get(TileId(200)).is_none());
    }
}
