//! All loaded worlds plus the blob store they persist to.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use lumar_world::{BlobStore, PersistError};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::world_context::{WorldContext, WorldTuning};

/// What the caller should do after a console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    Reply(String),
    Stop,
}

pub struct LumarServer {
    store: BlobStore,
    worlds: BTreeMap<String, WorldContext>,
    tick: u64,
    auto_save_interval_ticks: u64,
    save_tick_counter: u64,
}

impl LumarServer {
    /// Open the blob store and load every configured world.
    pub fn open(config: &ServerConfig) -> Result<Self, PersistError> {
        let mut store = BlobStore::open(Path::new(&config.storage.directory))?;
        let tuning = WorldTuning::from_config(config);

        let mut worlds = BTreeMap::new();
        for section in &config.worlds {
            let world = WorldContext::load(
                &section.name,
                section.world_seed(),
                section.planet,
                &tuning,
                &mut store,
            );
            worlds.insert(section.name.clone(), world);
        }

        let auto_save_interval_ticks =
            config.storage.auto_save_interval * config.server.tick_rate as u64;
        if auto_save_interval_ticks > 0 {
            info!(
                "Auto-save every {}s ({} ticks)",
                config.storage.auto_save_interval, auto_save_interval_ticks
            );
        }

        Ok(Self {
            store,
            worlds,
            tick: 0,
            auto_save_interval_ticks,
            save_tick_counter: 0,
        })
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn world(&self, name: &str) -> Option<&WorldContext> {
        self.worlds.get(name)
    }

    pub fn world_mut(&mut self, name: &str) -> Option<&mut WorldContext> {
        self.worlds.get_mut(name)
    }

    /// Tick every world, then auto-save if due.
    pub fn tick_all(&mut self) {
        self.tick += 1;
        for world in self.worlds.values_mut() {
            world.tick();
        }

        if self.auto_save_interval_ticks > 0 {
            self.save_tick_counter += 1;
            if self.save_tick_counter >= self.auto_save_interval_ticks {
                self.save_tick_counter = 0;
                self.save_all();
            }
        }
    }

    /// Save every world and flush. Failures are logged; the server keeps running.
    pub fn save_all(&mut self) -> usize {
        let mut saved = 0;
        for world in self.worlds.values() {
            match world.save(&mut self.store) {
                Ok(()) => saved += 1,
                Err(e) => warn!(world = world.name(), "Failed to save world: {e}"),
            }
        }
        if let Err(e) = self.store.flush() {
            warn!("Failed to flush LevelDB: {e}");
        }
        info!("Saved {saved}/{} world(s)", self.worlds.len());
        saved
    }

    pub fn handle_console_command(&mut self, line: &str) -> ConsoleAction {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return ConsoleAction::Reply(String::new());
        };
        match command {
            "status" => ConsoleAction::Reply(self.status_report()),
            "save" => {
                let saved = self.save_all();
                ConsoleAction::Reply(format!("Saved {saved} world(s)"))
            }
            "seethe" => {
                let Some(name) = parts.next() else {
                    return ConsoleAction::Reply("Usage: seethe <world>".into());
                };
                let reply = match self.worlds.get_mut(name).map(|w| w.force_transition()) {
                    Some(true) => {
                        info!(world = name, "Seethe transition forced from console");
                        format!("Seethe in {name} will flip on the next tick")
                    }
                    Some(false) => format!("World {name} is not on Lumar"),
                    None => format!("Unknown world: {name}"),
                };
                ConsoleAction::Reply(reply)
            }
            "stop" => ConsoleAction::Stop,
            other => ConsoleAction::Reply(format!(
                "Unknown command: {other}. Commands: status, save, seethe <world>, stop"
            )),
        }
    }

    fn status_report(&mut self) -> String {
        let mut out = format!("tick {} | {} world(s)", self.tick, self.worlds.len());
        for world in self.worlds.values_mut() {
            let seed = world.seed().value();
            let s = world.status();
            let seethe = match (s.seething, s.ticks_until_next_transition) {
                (Some(true), Some(t)) => format!("fluidized, {t} ticks to solid"),
                (Some(false), Some(t)) => format!("solid, {t} ticks to fluid"),
                _ => "inactive".to_string(),
            };
            let _ = write!(
                out,
                "\n  {} (seed {seed}): seethe {seethe}; {} rainline(s), {} client(s), {} cached cell(s)",
                s.name, s.rainlines, s.clients, s.cached_cells
            );
            if !s.planet {
                out.push_str(" [not on Lumar]");
            }
        }
        out
    }
}
