//! Spore types that fall from the moons over each lunagree.

use serde::Deserialize;

/// A spore type. The discriminant is the wire/persisted `spore_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SporeType {
    Verdant = 0,
    Roseite = 1,
    Zephyr = 2,
    Midnight = 3,
    Sunlight = 4,
    Azure = 5,
}

impl SporeType {
    pub const ALL: [SporeType; 6] = [
        SporeType::Verdant,
        SporeType::Roseite,
        SporeType::Zephyr,
        SporeType::Midnight,
        SporeType::Sunlight,
        SporeType::Azure,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            SporeType::Verdant => "verdant",
            SporeType::Roseite => "roseite",
            SporeType::Zephyr => "zephyr",
            SporeType::Midnight => "midnight",
            SporeType::Sunlight => "sunlight",
            SporeType::Azure => "azure",
        }
    }
}
