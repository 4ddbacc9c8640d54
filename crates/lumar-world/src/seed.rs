//! World seeds and the deterministic hashing derived from them.

use serde::Deserialize;

/// FNV-1a 64-bit offset basis.
const FNV1_64_INIT: u64 = 0xcbf2_9ce4_8422_2325;
/// FNV-1a 64-bit prime.
const FNV1_64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// The single input that determines all tide point placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldSeed(pub i64);

impl WorldSeed {
    /// Parse a seed the way players type it: integers are taken as-is,
    /// anything else is hashed.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.parse::<i64>() {
            Ok(v) => Self(v),
            Err(_) => Self(fnv1a_64(trimmed.as_bytes()) as i64),
        }
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

/// Seed as written in config: either a number or free text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SeedValue {
    Number(i64),
    Text(String),
}

impl From<SeedValue> for WorldSeed {
    fn from(value: SeedValue) -> Self {
        match value {
            SeedValue::Number(v) => WorldSeed(v),
            SeedValue::Text(s) => WorldSeed::from_text(&s),
        }
    }
}

/// Compute FNV-1a 64-bit hash of a byte slice.
pub fn fnv1a_64(data: &[u8]) -> u64 {
    let mut hash = FNV1_64_INIT;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV1_64_PRIME);
    }
    hash
}

/// SplitMix64 finalizer. Bijective, so distinct inputs never collide.
#[inline]
pub fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Hash a grid cell under a seed and a per-use salt.
pub fn hash_cell(seed: i64, salt: u64, cell_x: i32, cell_z: i32) -> u64 {
    let packed = ((cell_x as u32 as u64) << 32) | (cell_z as u32 as u64);
    mix64(mix64(seed as u64 ^ salt).wrapping_add(packed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_text_parses() {
        assert_eq!(WorldSeed::from_text("42"), WorldSeed(42));
        assert_eq!(WorldSeed::from_text(" -7 "), WorldSeed(-7));
    }

    #[test]
    fn text_seed_is_stable() {
        let a = WorldSeed::from_text("emerald sea");
        let b = WorldSeed::from_text("emerald sea");
        assert_eq!(a, b);
        assert_ne!(a, WorldSeed::from_text("crimson sea"));
    }

    #[test]
    fn fnv_known_vector() {
        // FNV-1a 64 of the empty string is the offset basis
        assert_eq!(fnv1a_64(b""), FNV1_64_INIT);
        assert_eq!(fnv1a_64(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn cell_hash_depends_on_every_input() {
        let base = hash_cell(42, 1, 3, -4);
        assert_eq!(base, hash_cell(42, 1, 3, -4));
        assert_ne!(base, hash_cell(43, 1, 3, -4));
        assert_ne!(base, hash_cell(42, 2, 3, -4));
        assert_ne!(base, hash_cell(42, 1, -4, 3));
    }

    #[test]
    fn seed_value_conversion() {
        let n: WorldSeed = SeedValue::Number(9).into();
        let t: WorldSeed = SeedValue::Text("9".into()).into();
        assert_eq!(n, t);
    }

    #[test]
    fn seed_value_from_toml() {
        #[derive(Deserialize)]
        struct W {
            seed: SeedValue,
        }
        let n: W = toml::from_str("seed = -5").unwrap();
        let t: W = toml::from_str("seed = \"lumar\"").unwrap();
        assert_eq!(WorldSeed::from(n.seed), WorldSeed(-5));
        assert_eq!(WorldSeed::from(t.seed), WorldSeed::from_text("lumar"));
    }
}
