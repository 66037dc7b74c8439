use thiserror::Error;

use crate::objects::ObjectId;

/// Errors raised by world construction and mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    /// A configuration value (world, road, biome table) is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An explicit object with this id is already stored.
    #[error("object {0} is already stored")]
    DuplicateObjectId(ObjectId),

    /// Id 0 identifies procedural objects and cannot be stored explicitly.
    #[error("object id 0 is reserved for procedural objects")]
    ReservedObjectId,
}

/// Errors raised while decoding a persisted chunk.
#[derive(Error, Debug)]
pub enum ChunkFormatError {
    #[error("chunk i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported chunk format version {found} (expected {expected})")]
    UnsupportedVersion { found: u8, expected: u8 },

    #[error("chunk edge {found} does not match the configured chunk size {expected}")]
    EdgeMismatch { found: u16, expected: u16 },

    #[error("chunk terrain truncated: expected {expected} bytes, got {found}")]
    Truncated { expected: usize, found: usize },
}
