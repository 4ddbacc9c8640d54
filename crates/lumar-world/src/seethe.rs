//! The seethe cycle: a world-wide toggle between fluid and solid seas.
//!
//! While seething the spore seas behave like a liquid; when stilled they can
//! be walked on. Phase lengths are drawn from configured bounds with an RNG
//! seeded by `(world seed, cycle)`, so every restart replays the same schedule.

use bytes::{BufMut, Bytes, BytesMut};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info};

use crate::blob::{read_bool, read_i64, read_u64, PersistentByteData};
use crate::error::PersistError;
use crate::seed::{mix64, WorldSeed};

const PERIOD_SALT: u64 = 0x5345_4554_4845_2121; // "SEETHE!!"

/// Phase length bounds, in ticks.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeetheConfig {
    pub fluid_min_ticks: i64,
    pub fluid_max_ticks: i64,
    pub solid_min_ticks: i64,
    pub solid_max_ticks: i64,
}

impl Default for SeetheConfig {
    fn default() -> Self {
        Self::uniform(12_000, 24_000)
    }
}

impl SeetheConfig {
    /// Same bounds for both phases.
    pub fn uniform(min_ticks: i64, max_ticks: i64) -> Self {
        Self {
            fluid_min_ticks: min_ticks,
            fluid_max_ticks: max_ticks,
            solid_min_ticks: min_ticks,
            solid_max_ticks: max_ticks,
        }
    }

    /// Inclusive `(min, max)` for a phase, clamped to at least one tick.
    pub fn bounds(&self, seething: bool) -> (i64, i64) {
        let (min, max) = if seething {
            (self.fluid_min_ticks, self.fluid_max_ticks)
        } else {
            (self.solid_min_ticks, self.solid_max_ticks)
        };
        let min = min.max(1);
        (min, max.max(min))
    }
}

/// Mutable schedule state; this is what gets persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeetheState {
    pub seething: bool,
    pub ticks_until_next_transition: i64,
    /// Number of transitions since the world was created.
    pub cycle: u64,
}

impl PersistentByteData for SeetheState {
    const BLOB_NAME: &'static str = "seethe";
    const BLOB_VERSION: u16 = 1;

    fn write_payload(&self, buf: &mut BytesMut) {
        buf.put_u8(self.seething as u8);
        buf.put_i64_le(self.ticks_until_next_transition);
        buf.put_u64_le(self.cycle);
    }

    fn read_payload(buf: &mut Bytes, _version: u16) -> Result<Self, PersistError> {
        let seething = read_bool(buf, "seething")?;
        let ticks_until_next_transition = read_i64(buf, "countdown")?;
        let cycle = read_u64(buf, "cycle")?;
        if ticks_until_next_transition < 1 {
            return Err(PersistError::InvalidValue(format!(
                "countdown {ticks_until_next_transition} must be positive"
            )));
        }
        Ok(Self {
            seething,
            ticks_until_next_transition,
            cycle,
        })
    }
}

/// Length of the phase that starts at `cycle`.
fn phase_length(seed: i64, cycle: u64, seething: bool, config: &SeetheConfig) -> i64 {
    let (min, max) = config.bounds(seething);
    let mut rng = StdRng::seed_from_u64(mix64(
        seed as u64 ^ PERIOD_SALT ^ cycle.wrapping_mul(0x9e37_79b9_7f4a_7c15),
    ));
    rng.gen_range(min..=max)
}

/// Countdown-driven seethe schedule for one world.
#[derive(Debug, Clone)]
pub struct SeetheSchedule {
    seed: i64,
    config: SeetheConfig,
    state: SeetheState,
}

impl SeetheSchedule {
    /// Fresh schedule: seething, first phase drawn for cycle 0.
    pub fn new(seed: WorldSeed, config: SeetheConfig) -> Self {
        let seed = seed.value();
        let state = SeetheState {
            seething: true,
            ticks_until_next_transition: phase_length(seed, 0, true, &config),
            cycle: 0,
        };
        Self {
            seed,
            config,
            state,
        }
    }

    /// Resume from persisted state. A countdown longer than the current
    /// bounds allow (tuning changed since the save) is shortened.
    pub fn from_state(seed: WorldSeed, config: SeetheConfig, mut state: SeetheState) -> Self {
        let (_, max) = config.bounds(state.seething);
        if state.ticks_until_next_transition > max {
            debug!(
                saved = state.ticks_until_next_transition,
                max, "seethe countdown exceeds configured bounds, clamping"
            );
            state.ticks_until_next_transition = max;
        }
        Self {
            seed: seed.value(),
            config,
            state,
        }
    }

    pub fn state(&self) -> SeetheState {
        self.state
    }

    pub fn config(&self) -> &SeetheConfig {
        &self.config
    }

    pub fn is_seething(&self) -> bool {
        self.state.seething
    }

    pub fn ticks_until_next_transition(&self) -> i64 {
        self.state.ticks_until_next_transition
    }

    /// Advance one tick; flips the phase when the countdown runs out.
    pub fn server_tick_weather(&mut self) {
        self.state.ticks_until_next_transition -= 1;
        if self.state.ticks_until_next_transition > 0 {
            return;
        }
        self.state.seething = !self.state.seething;
        self.state.cycle = self.state.cycle.wrapping_add(1);
        self.state.ticks_until_next_transition =
            phase_length(self.seed, self.state.cycle, self.state.seething, &self.config);
        info!(
            seething = self.state.seething,
            cycle = self.state.cycle,
            next_in = self.state.ticks_until_next_transition,
            "Seethe transition"
        );
    }

    /// Make the next `server_tick_weather` call flip the phase.
    pub fn force_transition(&mut self) {
        self.state.ticks_until_next_transition = 1;
    }
}

/// Per-world seethe access. Worlds that are not Lumar never seethe and
/// keep ordinary fluid seas.
#[derive(Debug, Clone)]
pub enum SeetheManager {
    Active(SeetheSchedule),
    Inactive,
}

impl SeetheManager {
    pub fn server_tick_weather(&mut self) {
        if let Self::Active(schedule) = self {
            schedule.server_tick_weather();
        }
    }

    pub fn is_seething(&self) -> bool {
        match self {
            Self::Active(schedule) => schedule.is_seething(),
            Self::Inactive => false,
        }
    }

    /// Whether seas currently behave as a liquid.
    pub fn is_fluid(&self) -> bool {
        match self {
            Self::Active(schedule) => schedule.is_seething(),
            Self::Inactive => true,
        }
    }

    pub fn sea_surface(&self) -> SeaSurface {
        SeaSurface::from_fluid(self.is_fluid())
    }

    pub fn ticks_until_next_transition(&self) -> Option<i64> {
        match self {
            Self::Active(schedule) => Some(schedule.ticks_until_next_transition()),
            Self::Inactive => None,
        }
    }

    pub fn force_transition(&mut self) {
        if let Self::Active(schedule) = self {
            schedule.force_transition();
        }
    }

    pub fn state(&self) -> Option<SeetheState> {
        match self {
            Self::Active(schedule) => Some(schedule.state()),
            Self::Inactive => None,
        }
    }
}

/// How the sea surface behaves for movement and pathing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeaSurface {
    Liquid,
    Solid,
}

impl SeaSurface {
    pub fn from_fluid(is_fluid: bool) -> Self {
        if is_fluid {
            Self::Liquid
        } else {
            Self::Solid
        }
    }

    pub fn is_walkable(self) -> bool {
        self == Self::Solid
    }

    /// Pathfinding cost multiplier for a sea block.
    pub fn path_cost(self) -> f32 {
        match self {
            Self::Liquid => 8.0,
            Self::Solid => 1.0,
        }
    }
}
