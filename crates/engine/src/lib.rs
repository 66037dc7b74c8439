//! Infinite 2D tile world: chunked terrain, deterministic procedural
//! features, placed structures, roads, and circle-vs-tile collision.

pub mod collision;
pub mod config;
pub mod error;
pub mod objects;
pub mod road;
pub mod world;

pub use collision::CollisionResolver;
pub use config::WorldConfig;
pub use error::{ChunkFormatError, WorldError};
pub use world::World;
