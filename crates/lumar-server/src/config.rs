use serde::Deserialize;
use std::path::Path;

use lumar_game::RainlineConfig;
use lumar_world::seed::SeedValue;
use lumar_world::{LunagreeConfig, SeetheConfig, WorldSeed};

use crate::sync::SyncConfig;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub storage: StorageSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub worlds: Vec<WorldSection>,
    #[serde(default)]
    pub lunagree: LunagreeConfig,
    #[serde(default)]
    pub seethe: SeetheConfig,
    #[serde(default)]
    pub rainline: RainlineConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Ticks per second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
}

fn default_server_name() -> String {
    "Lumar".into()
}

fn default_tick_rate() -> u32 {
    20
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            tick_rate: default_tick_rate(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_storage_directory")]
    pub directory: String,
    /// Auto-save interval in seconds. 0 = disabled. Default: 300 (5 minutes).
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval: u64,
}

fn default_storage_directory() -> String {
    "lumar_db".into()
}

fn default_auto_save_interval() -> u64 {
    300
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            directory: default_storage_directory(),
            auto_save_interval: default_auto_save_interval(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    pub name: String,
    pub seed: SeedValue,
    /// Whether this world is on Lumar (seethe, lunagrees and rainlines active).
    #[serde(default = "default_planet")]
    pub planet: bool,
}

fn default_planet() -> bool {
    true
}

impl WorldSection {
    pub fn world_seed(&self) -> WorldSeed {
        self.seed.clone().into()
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.server.tick_rate == 0 {
            return Err("server.tick_rate must be positive".into());
        }
        let mut names: Vec<&str> = self.worlds.iter().map(|w| w.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(format!("duplicate world name `{}`", pair[0]).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumar_world::SporeType;

    #[test]
    fn parse_minimal_config() {
        let toml_str = r#"
            [logging]
            level = "info"

            [[worlds]]
            name = "lumar"
            seed = 42
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.tick_rate, 20);
        assert_eq!(config.server.name, "Lumar");
        assert_eq!(config.storage.directory, "lumar_db");
        assert_eq!(config.storage.auto_save_interval, 300); // default
        assert_eq!(config.worlds.len(), 1);
        assert!(config.worlds[0].planet);
        assert_eq!(config.worlds[0].world_seed(), WorldSeed(42));
        // tuning sections default when absent
        assert_eq!(config.lunagree.cell_size, 256);
        assert_eq!(config.seethe.fluid_min_ticks, 12_000);
        assert_eq!(config.rainline.spawn_interval, 20);
        assert_eq!(config.sync.view_radius_blocks, 512);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            [server]
            name = "Test"
            tick_rate = 10

            [storage]
            directory = "/tmp/lumar"
            auto_save_interval = 0

            [logging]
            level = "debug"

            [[worlds]]
            name = "lumar"
            seed = "spore seas"

            [[worlds]]
            name = "overworld"
            seed = "-17"
            planet = false

            [lunagree]
            cell_size = 128
            density = 0.5
            palette = ["verdant", "midnight"]

            [seethe]
            fluid_min_ticks = 100
            fluid_max_ticks = 200

            [rainline]
            max_rainlines = 4

            [sync]
            refresh_cells = 2
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.tick_rate, 10);
        assert_eq!(config.storage.auto_save_interval, 0);
        assert_eq!(
            config.worlds[0].world_seed(),
            WorldSeed::from_text("spore seas")
        );
        assert_eq!(config.worlds[1].world_seed(), WorldSeed(-17));
        assert!(!config.worlds[1].planet);
        assert_eq!(config.lunagree.cell_size, 128);
        assert_eq!(
            config.lunagree.palette,
            vec![SporeType::Verdant, SporeType::Midnight]
        );
        // unset fields in a present section keep their defaults
        assert_eq!(config.lunagree.edge_margin, 32);
        assert_eq!(config.seethe.fluid_max_ticks, 200);
        assert_eq!(config.seethe.solid_max_ticks, 24_000);
        assert_eq!(config.rainline.max_rainlines, 4);
        assert_eq!(config.sync.refresh_cells, 2);
    }

    #[test]
    fn duplicate_world_names_rejected() {
        let toml_str = r#"
            [logging]
            level = "info"

            [[worlds]]
            name = "a"
            seed = 1

            [[worlds]]
            name = "a"
            seed = 2
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("lumar_cfg_{}.toml", rand::random::<u64>()));
        std::fs::write(
            &path,
            "[logging]\nlevel = \"warn\"\n\n[[worlds]]\nname = \"w\"\nseed = 7\n",
        )
        .unwrap();
        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.logging.level, "warn");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_error() {
        assert!(ServerConfig::load("/nonexistent/lumar/server.toml").is_err());
    }
}
