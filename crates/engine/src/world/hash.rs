//! Deterministic coordinate hashing.
//!
//! Every procedural decision in the world (biome choice, feature placement,
//! feature variants) is derived from [`hash32`]. It has no per-process state,
//! so a world seed reproduces the same world on every run and every machine.

const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Salted 32-bit hash of an integer coordinate pair.
///
/// FNV-1a style accumulation of `x`, `y` and `salt`, followed by a
/// murmur-style avalanche so neighbouring tiles get uncorrelated bits.
#[inline]
pub const fn hash32(x: i32, y: i32, salt: i32) -> u32 {
    let mut h = FNV_OFFSET;
    h = (h ^ x as u32).wrapping_mul(FNV_PRIME);
    h = (h ^ y as u32).wrapping_mul(FNV_PRIME);
    h = (h ^ salt as u32).wrapping_mul(FNV_PRIME);

    h ^= h >> 16;
    h = h.wrapping_mul(2_246_822_519);
    h ^= h >> 13;
    h = h.wrapping_mul(3_266_489_917);
    h ^= h >> 16;
    h
}
