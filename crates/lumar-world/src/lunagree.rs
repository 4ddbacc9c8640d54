//! Lunagree (tide point) placement on an infinite grid.
//!
//! The plane is cut into square cells of `cell_size` blocks. Each cell holds
//! at most one lunagree, decided by a hash of `(seed, cell_x, cell_z)`, so the
//! whole layout can be regenerated from the seed alone. Generated cells are
//! cached; the cache is bounded and can be dropped at any time.

use std::collections::HashMap;

use bytes::{BufMut, Bytes, BytesMut};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::blob::{read_bool, read_i32, read_i64, read_u32, read_u8, PersistentByteData};
use crate::error::PersistError;
use crate::seed::{hash_cell, mix64, WorldSeed};
use crate::spore::SporeType;

/// Largest neighborhood radius (in cells) a single query will scan.
pub const MAX_SEARCH_RADIUS: i32 = 16;

/// Upper bound on points returned by an area query.
pub const MAX_AREA_RESULTS: usize = 4096;

const PRESENCE_SALT: u64 = 0x4c55_4e41_4752_4545; // "LUNAGREE"
const OFFSET_SALT: u64 = 0x6f66_6673_6574_7321;
const SPORE_SALT: u64 = 0x7370_6f72_6573_2121;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Placement tuning for one world.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LunagreeConfig {
    /// Side length of a grid cell in blocks.
    pub cell_size: i32,
    /// Fraction of cells that hold a lunagree, in `[0, 1]`.
    pub density: f64,
    /// Minimum distance between a lunagree and its cell border.
    pub edge_margin: i32,
    /// Spore types a lunagree may carry.
    pub palette: Vec<SporeType>,
    /// Maximum number of cached cells.
    pub cache_capacity: usize,
    /// Distance from a lunagree within which its spores fall.
    pub fall_radius: i32,
}

impl Default for LunagreeConfig {
    fn default() -> Self {
        Self {
            cell_size: 256,
            density: 0.35,
            edge_margin: 32,
            palette: SporeType::ALL.to_vec(),
            cache_capacity: 4096,
            fall_radius: 96,
        }
    }
}

impl LunagreeConfig {
    /// Clamp values into ranges the generator can work with.
    fn sanitized(mut self) -> Self {
        self.cell_size = self.cell_size.max(16);
        self.edge_margin = self.edge_margin.clamp(0, (self.cell_size - 1) / 2);
        if !(0.0..=1.0).contains(&self.density) {
            self.density = self.density.clamp(0.0, 1.0);
        }
        if self.density.is_nan() {
            self.density = 0.0;
        }
        if self.palette.is_empty() {
            self.palette = SporeType::ALL.to_vec();
        }
        self.cache_capacity = self.cache_capacity.max(1);
        self.fall_radius = self.fall_radius.max(0);
        self
    }

    /// Hash of everything besides the seed that shapes placement.
    fn fingerprint(&self) -> u32 {
        let mut h = mix64(self.cell_size as u64);
        h = mix64(h ^ self.density.to_bits());
        h = mix64(h ^ self.edge_margin as u64);
        for spore in &self.palette {
            h = mix64(h ^ spore.id() as u64);
        }
        (h >> 32) as u32
    }
}

// ---------------------------------------------------------------------------
// LunagreeLocation
// ---------------------------------------------------------------------------

/// One tide point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LunagreeLocation {
    pub block_x: i32,
    pub block_z: i32,
    pub spore_id: u8,
}

impl LunagreeLocation {
    /// Squared horizontal distance to a block position.
    pub fn distance_sq(&self, x: i32, z: i32) -> i64 {
        let dx = self.block_x as i64 - x as i64;
        let dz = self.block_z as i64 - z as i64;
        dx.saturating_mul(dx).saturating_add(dz.saturating_mul(dz))
    }

    pub fn spore(&self) -> Option<SporeType> {
        SporeType::from_id(self.spore_id)
    }

    /// Coordinates, used as the identity of a lunagree.
    pub fn key(&self) -> (i32, i32) {
        (self.block_x, self.block_z)
    }
}

/// Pick the closer of two candidates, ties going to the lowest `(x, z)`.
fn closer(
    best: Option<(i64, LunagreeLocation)>,
    candidate: LunagreeLocation,
    x: i32,
    z: i32,
) -> Option<(i64, LunagreeLocation)> {
    let d = candidate.distance_sq(x, z);
    match best {
        Some((bd, b)) if (bd, b.block_x, b.block_z) <= (d, candidate.block_x, candidate.block_z) => {
            Some((bd, b))
        }
        _ => Some((d, candidate)),
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct CacheSlot {
    location: Option<LunagreeLocation>,
    last_used: u64,
}

/// Seed-driven lunagree generator with a lazily filled cell cache.
pub struct LunagreeGenerator {
    seed: i64,
    config: LunagreeConfig,
    /// Presence test threshold on the top 32 bits of the cell hash.
    presence_threshold: u64,
    fingerprint: u32,
    cache: HashMap<(i32, i32), CacheSlot>,
    clock: u64,
}

impl LunagreeGenerator {
    pub fn new(seed: WorldSeed, config: LunagreeConfig) -> Self {
        let config = config.sanitized();
        let presence_threshold = (config.density * 4_294_967_296.0) as u64;
        let fingerprint = config.fingerprint();
        Self {
            seed: seed.value(),
            config,
            presence_threshold,
            fingerprint,
            cache: HashMap::new(),
            clock: 0,
        }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn cell_size(&self) -> i32 {
        self.config.cell_size
    }

    pub fn config(&self) -> &LunagreeConfig {
        &self.config
    }

    /// Number of cells currently cached.
    pub fn cached_cells(&self) -> usize {
        self.cache.len()
    }

    /// Cell coordinate containing a block coordinate.
    pub fn cell_of(&self, block: i32) -> i32 {
        block.div_euclid(self.config.cell_size)
    }

    /// Generate a cell without touching the cache. Pure in `(seed, config, cell)`.
    pub fn generate_cell(&self, cell_x: i32, cell_z: i32) -> Option<LunagreeLocation> {
        let presence = hash_cell(self.seed, PRESENCE_SALT, cell_x, cell_z);
        if (presence >> 32) >= self.presence_threshold {
            return None;
        }

        let size = self.config.cell_size as i64;
        let margin = self.config.edge_margin as i64;
        let span = (size - 2 * margin).max(1) as u64;

        let offsets = hash_cell(self.seed, OFFSET_SALT, cell_x, cell_z);
        let off_x = margin + (offsets % span) as i64;
        let off_z = margin + ((offsets >> 32) % span) as i64;

        let block_x = i32::try_from(cell_x as i64 * size + off_x).ok()?;
        let block_z = i32::try_from(cell_z as i64 * size + off_z).ok()?;

        let palette = &self.config.palette;
        let pick = hash_cell(self.seed, SPORE_SALT, cell_x, cell_z) % palette.len() as u64;
        let spore_id = palette[pick as usize].id();

        Some(LunagreeLocation {
            block_x,
            block_z,
            spore_id,
        })
    }

    /// The lunagree of a cell, generating and caching it on first use.
    pub fn lunagree_in_cell(&mut self, cell_x: i32, cell_z: i32) -> Option<LunagreeLocation> {
        self.clock += 1;
        if let Some(slot) = self.cache.get_mut(&(cell_x, cell_z)) {
            slot.last_used = self.clock;
            return slot.location;
        }
        let location = self.generate_cell(cell_x, cell_z);
        self.insert_cached((cell_x, cell_z), location);
        location
    }

    /// Closest lunagree to `(x, z)` among cells within `search_radius` cells
    /// of the query cell. Ties go to the lowest `(block_x, block_z)`.
    pub fn nearest_lunagree(
        &mut self,
        x: i32,
        z: i32,
        search_radius: i32,
    ) -> Option<LunagreeLocation> {
        if search_radius < 0 {
            return None;
        }
        let radius = if search_radius > MAX_SEARCH_RADIUS {
            debug!(
                requested = search_radius,
                max = MAX_SEARCH_RADIUS,
                "lunagree search radius clamped"
            );
            MAX_SEARCH_RADIUS
        } else {
            search_radius
        };

        let center_x = self.cell_of(x);
        let center_z = self.cell_of(z);
        let mut best = None;
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                let (Some(cell_x), Some(cell_z)) =
                    (center_x.checked_add(dx), center_z.checked_add(dz))
                else {
                    continue;
                };
                if let Some(candidate) = self.lunagree_in_cell(cell_x, cell_z) {
                    best = closer(best, candidate, x, z);
                }
            }
        }
        best.map(|(_, location)| location)
    }

    /// All lunagrees within `radius` blocks of `(x, z)`, ordered by `(x, z)`.
    pub fn lunagrees_in_area(&mut self, x: i32, z: i32, radius: i32) -> Vec<LunagreeLocation> {
        if radius < 0 {
            return Vec::new();
        }
        let cell_radius = (radius / self.config.cell_size + 1).min(MAX_SEARCH_RADIUS);
        let center_x = self.cell_of(x);
        let center_z = self.cell_of(z);
        let radius_sq = radius as i64 * radius as i64;

        let mut found = Vec::new();
        for dx in -cell_radius..=cell_radius {
            for dz in -cell_radius..=cell_radius {
                let (Some(cell_x), Some(cell_z)) =
                    (center_x.checked_add(dx), center_z.checked_add(dz))
                else {
                    continue;
                };
                if let Some(location) = self.lunagree_in_cell(cell_x, cell_z) {
                    if location.distance_sq(x, z) <= radius_sq {
                        found.push(location);
                    }
                }
            }
        }
        found.sort_unstable_by_key(|l| (l.block_x, l.block_z));
        found.truncate(MAX_AREA_RESULTS);
        found
    }

    /// Spore type falling at `(x, z)`: the nearest lunagree's, if within its fall radius.
    pub fn spore_fall_at(&mut self, x: i32, z: i32) -> Option<SporeType> {
        let fall_radius = self.config.fall_radius as i64;
        let cells = self.config.fall_radius / self.config.cell_size + 1;
        let nearest = self.nearest_lunagree(x, z, cells)?;
        if nearest.distance_sq(x, z) <= fall_radius * fall_radius {
            nearest.spore()
        } else {
            None
        }
    }

    fn insert_cached(&mut self, key: (i32, i32), location: Option<LunagreeLocation>) {
        if self.cache.len() >= self.config.cache_capacity {
            self.evict_stale();
        }
        self.cache.insert(
            key,
            CacheSlot {
                location,
                last_used: self.clock,
            },
        );
    }

    /// Drop the least recently used quarter of the cache.
    fn evict_stale(&mut self) {
        if self.cache.is_empty() {
            return;
        }
        let evict = (self.cache.len() / 4).max(1);
        let mut ages: Vec<u64> = self.cache.values().map(|s| s.last_used).collect();
        ages.sort_unstable();
        let cutoff = ages[evict - 1];
        self.cache.retain(|_, slot| slot.last_used > cutoff);
    }

    /// Snapshot the cache for persistence, ordered by cell.
    pub fn export_cache(&self) -> LunagreeCache {
        let mut entries: Vec<((i32, i32), Option<LunagreeLocation>)> = self
            .cache
            .iter()
            .map(|(&cell, slot)| (cell, slot.location))
            .collect();
        entries.sort_unstable_by_key(|(cell, _)| *cell);
        LunagreeCache {
            seed: self.seed,
            cell_size: self.config.cell_size,
            fingerprint: self.fingerprint,
            entries,
        }
    }

    /// Merge a persisted cache. Entries from another seed or tuning are
    /// discarded. Returns the number of cells merged.
    pub fn import_cache(&mut self, cache: LunagreeCache) -> usize {
        if cache.seed != self.seed
            || cache.cell_size != self.config.cell_size
            || cache.fingerprint != self.fingerprint
        {
            warn!(
                "Discarding lunagree cache: built for seed {} / cell size {}, world uses seed {} / cell size {}",
                cache.seed, cache.cell_size, self.seed, self.config.cell_size
            );
            return 0;
        }
        let mut merged = 0;
        for (cell, location) in cache.entries {
            if self.cache.contains_key(&cell) {
                continue;
            }
            self.clock += 1;
            self.insert_cached(cell, location);
            merged += 1;
        }
        merged
    }
}

// ---------------------------------------------------------------------------
// LunagreeManager
// ---------------------------------------------------------------------------

/// Per-world lunagree access. Worlds that are not Lumar have no tide points.
pub enum LunagreeManager {
    Active(LunagreeGenerator),
    Inactive,
}

impl LunagreeManager {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn generator(&self) -> Option<&LunagreeGenerator> {
        match self {
            Self::Active(g) => Some(g),
            Self::Inactive => None,
        }
    }

    pub fn generator_mut(&mut self) -> Option<&mut LunagreeGenerator> {
        match self {
            Self::Active(g) => Some(g),
            Self::Inactive => None,
        }
    }

    pub fn nearest_lunagree(
        &mut self,
        x: i32,
        z: i32,
        search_radius: i32,
    ) -> Option<LunagreeLocation> {
        self.generator_mut()?
            .nearest_lunagree(x, z, search_radius)
    }

    pub fn lunagrees_in_area(&mut self, x: i32, z: i32, radius: i32) -> Vec<LunagreeLocation> {
        match self {
            Self::Active(g) => g.lunagrees_in_area(x, z, radius),
            Self::Inactive => Vec::new(),
        }
    }

    pub fn spore_fall_at(&mut self, x: i32, z: i32) -> Option<SporeType> {
        self.generator_mut()?.spore_fall_at(x, z)
    }
}

// ---------------------------------------------------------------------------
// Persisted cache
// ---------------------------------------------------------------------------

/// Persisted form of the generator cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LunagreeCache {
    pub seed: i64,
    pub cell_size: i32,
    pub fingerprint: u32,
    pub entries: Vec<((i32, i32), Option<LunagreeLocation>)>,
}

impl PersistentByteData for LunagreeCache {
    const BLOB_NAME: &'static str = "lunagree_cache";
    const BLOB_VERSION: u16 = 1;

    fn write_payload(&self, buf: &mut BytesMut) {
        buf.put_i64_le(self.seed);
        buf.put_i32_le(self.cell_size);
        buf.put_u32_le(self.fingerprint);
        buf.put_u32_le(self.entries.len() as u32);
        for ((cell_x, cell_z), location) in &self.entries {
            buf.put_i32_le(*cell_x);
            buf.put_i32_le(*cell_z);
            match location {
                Some(l) => {
                    buf.put_u8(1);
                    buf.put_i32_le(l.block_x);
                    buf.put_i32_le(l.block_z);
                    buf.put_u8(l.spore_id);
                }
                None => buf.put_u8(0),
            }
        }
    }

    fn read_payload(buf: &mut Bytes, _version: u16) -> Result<Self, PersistError> {
        let seed = read_i64(buf, "seed")?;
        let cell_size = read_i32(buf, "cell size")?;
        let fingerprint = read_u32(buf, "fingerprint")?;
        let count = read_u32(buf, "entry count")? as usize;
        // Smallest entry is 9 bytes; reject counts the payload cannot hold.
        if count > buf.len() / 9 {
            return Err(PersistError::InvalidValue(format!(
                "entry count {count} exceeds payload"
            )));
        }
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let cell_x = read_i32(buf, "cell x")?;
            let cell_z = read_i32(buf, "cell z")?;
            let location = if read_bool(buf, "presence")? {
                Some(LunagreeLocation {
                    block_x: read_i32(buf, "block x")?,
                    block_z: read_i32(buf, "block z")?,
                    spore_id: read_u8(buf, "spore id")?,
                })
            } else {
                None
            };
            entries.push(((cell_x, cell_z), location));
        }
        Ok(Self {
            seed,
            cell_size,
            fingerprint,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: i64) -> LunagreeGenerator {
        LunagreeGenerator::new(WorldSeed(seed), LunagreeConfig::default())
    }

    /// Brute-force nearest over every cell in range, with no cache.
    fn oracle(
        g: &LunagreeGenerator,
        x: i32,
        z: i32,
        radius: i32,
    ) -> Option<LunagreeLocation> {
        let cx = g.cell_of(x);
        let cz = g.cell_of(z);
        let mut all = Vec::new();
        for cell_x in cx - radius..=cx + radius {
            for cell_z in cz - radius..=cz + radius {
                all.extend(g.generate_cell(cell_x, cell_z));
            }
        }
        all.into_iter()
            .min_by_key(|l| (l.distance_sq(x, z), l.block_x, l.block_z))
    }

    #[test]
    fn generation_is_pure() {
        let g = generator(42);
        for cell_x in -20..20 {
            for cell_z in -20..20 {
                assert_eq!(g.generate_cell(cell_x, cell_z), g.generate_cell(cell_x, cell_z));
            }
        }
    }

    #[test]
    fn points_stay_inside_their_cell_margin() {
        let g = generator(7);
        let size = g.cell_size();
        let margin = g.config().edge_margin;
        for cell_x in -30..30 {
            for cell_z in -30..30 {
                if let Some(l) = g.generate_cell(cell_x, cell_z) {
                    let ox = l.block_x - cell_x * size;
                    let oz = l.block_z - cell_z * size;
                    assert!((margin..size - margin).contains(&ox), "x offset {ox}");
                    assert!((margin..size - margin).contains(&oz), "z offset {oz}");
                    assert!(l.spore().is_some());
                }
            }
        }
    }

    #[test]
    fn layout_is_sparse() {
        let g = generator(1234);
        let occupied = (0..100)
            .flat_map(|x| (0..100).map(move |z| (x, z)))
            .filter(|&(x, z)| g.generate_cell(x, z).is_some())
            .count();
        // density 0.35 over 10_000 cells
        assert!((3000..4000).contains(&occupied), "occupied = {occupied}");
    }

    #[test]
    fn nearest_matches_brute_force() {
        let mut g = generator(99);
        let probes = [
            (0, 0),
            (1000, -1000),
            (-5000, 333),
            (127, 128),
            (-1, -1),
            (77_777, -12_345),
        ];
        for &(x, z) in &probes {
            for radius in 0..=3 {
                let expected = oracle(&g, x, z, radius);
                assert_eq!(g.nearest_lunagree(x, z, radius), expected, "({x}, {z}) r={radius}");
                // cached second call agrees
                assert_eq!(g.nearest_lunagree(x, z, radius), expected);
            }
        }
    }

    #[test]
    fn seed_42_stable_across_fresh_generators() {
        let config = LunagreeConfig {
            cell_size: 256,
            ..LunagreeConfig::default()
        };
        let first = LunagreeGenerator::new(WorldSeed(42), config.clone()).nearest_lunagree(0, 0, 2);
        let second = LunagreeGenerator::new(WorldSeed(42), config).nearest_lunagree(0, 0, 2);
        assert!(first.is_some(), "25 cells at density 0.35 should hold a lunagree");
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_differ() {
        let a: Vec<_> = (0..50).map(|c| generator(1).generate_cell(c, 0)).collect();
        let b: Vec<_> = (0..50).map(|c| generator(2).generate_cell(c, 0)).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn negative_radius_is_none() {
        let mut g = generator(3);
        assert_eq!(g.nearest_lunagree(0, 0, -1), None);
        assert_eq!(g.cached_cells(), 0);
    }

    #[test]
    fn huge_radius_is_clamped() {
        let mut g = generator(3);
        let clamped = g.nearest_lunagree(500, 500, i32::MAX);
        assert_eq!(clamped, oracle(&g, 500, 500, MAX_SEARCH_RADIUS));
        let side = (2 * MAX_SEARCH_RADIUS + 1) as usize;
        assert!(g.cached_cells() <= side * side);
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let mut g = generator(5);
        g.nearest_lunagree(i32::MAX, i32::MIN, 2);
        g.nearest_lunagree(i32::MIN, i32::MAX, 2);
    }

    #[test]
    fn empty_world_has_no_lunagrees() {
        let config = LunagreeConfig {
            density: 0.0,
            ..LunagreeConfig::default()
        };
        let mut g = LunagreeGenerator::new(WorldSeed(1), config);
        assert_eq!(g.nearest_lunagree(0, 0, 4), None);
    }

    #[test]
    fn tie_prefers_lowest_coordinates() {
        let a = LunagreeLocation {
            block_x: 10,
            block_z: 0,
            spore_id: 0,
        };
        let b = LunagreeLocation {
            block_x: -10,
            block_z: 0,
            spore_id: 1,
        };
        let best = closer(closer(None, a, 0, 0), b, 0, 0);
        assert_eq!(best.map(|(_, l)| l), Some(b));
        let best = closer(closer(None, b, 0, 0), a, 0, 0);
        assert_eq!(best.map(|(_, l)| l), Some(b));
    }

    #[test]
    fn area_query_respects_radius_and_order() {
        let mut g = generator(11);
        let found = g.lunagrees_in_area(0, 0, 700);
        assert!(found.windows(2).all(|w| w[0].key() < w[1].key()));
        assert!(found.iter().all(|l| l.distance_sq(0, 0) <= 700 * 700));
        let nearest = g.nearest_lunagree(0, 0, 3).unwrap();
        if nearest.distance_sq(0, 0) <= 700 * 700 {
            assert!(found.contains(&nearest));
        }
    }

    #[test]
    fn spore_fall_only_near_a_lunagree() {
        let mut g = generator(21);
        let l = g.nearest_lunagree(0, 0, 4).unwrap();
        assert_eq!(g.spore_fall_at(l.block_x, l.block_z), l.spore());
        assert_eq!(g.spore_fall_at(l.block_x + 10, l.block_z - 10), l.spore());
    }

    #[test]
    fn spore_fall_reaches_past_neighbouring_cells() {
        let config = LunagreeConfig {
            cell_size: 16,
            density: 0.05,
            fall_radius: 96,
            ..LunagreeConfig::default()
        };
        let mut g = LunagreeGenerator::new(WorldSeed(5), config);
        let reach = 96i64 * 96;
        let mut far_hits = 0;
        for x in (-400..400).step_by(37) {
            for z in (-400..400).step_by(41) {
                let expected = oracle(&g, x, z, 7).filter(|l| l.distance_sq(x, z) <= reach);
                if expected.is_some_and(|l| l.distance_sq(x, z) > 32 * 32) {
                    far_hits += 1;
                }
                assert_eq!(g.spore_fall_at(x, z), expected.and_then(|l| l.spore()), "at {x},{z}");
            }
        }
        assert!(far_hits > 0);
    }

    #[test]
    fn palette_restricts_spores() {
        let config = LunagreeConfig {
            palette: vec![SporeType::Midnight],
            density: 1.0,
            ..LunagreeConfig::default()
        };
        let g = LunagreeGenerator::new(WorldSeed(8), config);
        for c in 0..40 {
            let l = g.generate_cell(c, -c).unwrap();
            assert_eq!(l.spore(), Some(SporeType::Midnight));
        }
    }

    #[test]
    fn cache_stays_bounded_and_lossless() {
        let config = LunagreeConfig {
            cache_capacity: 64,
            ..LunagreeConfig::default()
        };
        let mut g = LunagreeGenerator::new(WorldSeed(17), config);
        for i in 0..40 {
            let x = i * 1000;
            let expected = oracle(&g, x, 0, 2);
            assert_eq!(g.nearest_lunagree(x, 0, 2), expected);
            assert!(g.cached_cells() <= 64);
        }
    }

    #[test]
    fn cache_blob_restores_and_merges() {
        let mut g = generator(42);
        g.nearest_lunagree(0, 0, 2);
        let cache = g.export_cache();
        let restored = LunagreeCache::from_bytes(&cache.to_bytes()).unwrap();
        assert_eq!(restored, cache);

        let mut fresh = generator(42);
        assert_eq!(fresh.import_cache(restored), 25);
        assert_eq!(fresh.nearest_lunagree(0, 0, 2), g.nearest_lunagree(0, 0, 2));
    }

    #[test]
    fn cache_from_other_seed_is_discarded() {
        let mut g = generator(1);
        g.nearest_lunagree(0, 0, 1);
        let mut other = generator(2);
        assert_eq!(other.import_cache(g.export_cache()), 0);
        assert_eq!(other.cached_cells(), 0);
    }

    #[test]
    fn cache_from_other_tuning_is_discarded() {
        let mut g = generator(1);
        g.nearest_lunagree(0, 0, 1);
        let config = LunagreeConfig {
            density: 0.9,
            ..LunagreeConfig::default()
        };
        let mut other = LunagreeGenerator::new(WorldSeed(1), config);
        assert_eq!(other.import_cache(g.export_cache()), 0);
    }

    #[test]
    fn inflated_entry_count_rejected() {
        let cache = LunagreeCache {
            seed: 1,
            cell_size: 256,
            fingerprint: 0,
            entries: Vec::new(),
        };
        let mut payload = BytesMut::new();
        cache.write_payload(&mut payload);
        let len = payload.len();
        payload[len - 4..].copy_from_slice(&1_000_000u32.to_le_bytes());
        let blob = crate::blob::wrap(LunagreeCache::BLOB_VERSION, &payload);
        assert!(LunagreeCache::from_bytes(&blob).is_err());
    }

    #[test]
    fn inactive_manager_has_nothing() {
        let mut m = LunagreeManager::Inactive;
        assert!(!m.is_active());
        assert_eq!(m.nearest_lunagree(0, 0, 4), None);
        assert!(m.lunagrees_in_area(0, 0, 1000).is_empty());
        assert_eq!(m.spore_fall_at(0, 0), None);
        assert!(m.generator_mut().is_none());
    }

    #[test]
    fn active_manager_delegates() {
        let mut m = LunagreeManager::Active(generator(42));
        assert_eq!(m.nearest_lunagree(0, 0, 2), generator(42).nearest_lunagree(0, 0, 2));
    }
}
