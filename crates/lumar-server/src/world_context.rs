//! Per-world binding of the Lumar managers to the tick loop and clients.

use bytes::Bytes;
use lumar_game::{RainlineConfig, RainlineManager};
use lumar_world::lunagree::LunagreeCache;
use lumar_world::{
    BlobLoad, BlobStore, LunagreeConfig, LunagreeGenerator, LunagreeLocation, LunagreeManager,
    PersistError, SeetheConfig, SeetheManager, SeetheSchedule, SporeType, WorldSeed,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::sync::{ClientId, SyncConfig, SyncLayer};

/// Tuning shared by every world on the server.
#[derive(Debug, Clone, Default)]
pub struct WorldTuning {
    pub lunagree: LunagreeConfig,
    pub seethe: SeetheConfig,
    pub rainline: RainlineConfig,
    pub sync: SyncConfig,
}

impl WorldTuning {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            lunagree: config.lunagree.clone(),
            seethe: config.seethe.clone(),
            rainline: config.rainline.clone(),
            sync: config.sync.clone(),
        }
    }
}

/// Summary line data for the `status` command.
#[derive(Debug, Clone)]
pub struct WorldStatus {
    pub name: String,
    pub planet: bool,
    pub seething: Option<bool>,
    pub ticks_until_next_transition: Option<i64>,
    pub rainlines: usize,
    pub clients: usize,
    pub cached_cells: usize,
}

pub struct WorldContext {
    name: String,
    seed: WorldSeed,
    lunagree: LunagreeManager,
    seethe: SeetheManager,
    rainlines: RainlineManager,
    sync: SyncLayer,
}

impl WorldContext {
    /// Fresh world state derived from the seed alone.
    pub fn new(name: &str, seed: WorldSeed, planet: bool, tuning: &WorldTuning) -> Self {
        let (lunagree, seethe) = if planet {
            (
                LunagreeManager::Active(LunagreeGenerator::new(seed, tuning.lunagree.clone())),
                SeetheManager::Active(SeetheSchedule::new(seed, tuning.seethe.clone())),
            )
        } else {
            (LunagreeManager::Inactive, SeetheManager::Inactive)
        };
        Self::assemble(name, seed, lunagree, seethe, tuning)
    }

    /// Build a world, restoring persisted seethe state and lunagree cache.
    /// Missing or unreadable blobs fall back to fresh state.
    pub fn load(
        name: &str,
        seed: WorldSeed,
        planet: bool,
        tuning: &WorldTuning,
        store: &mut BlobStore,
    ) -> Self {
        if !planet {
            info!(world = name, "Loaded world (not on Lumar)");
            return Self::new(name, seed, planet, tuning);
        }

        let state = store.load_or_else(name, || {
            SeetheSchedule::new(seed, tuning.seethe.clone()).state()
        });
        let seethe =
            SeetheManager::Active(SeetheSchedule::from_state(seed, tuning.seethe.clone(), state));

        let mut generator = LunagreeGenerator::new(seed, tuning.lunagree.clone());
        match store.load::<LunagreeCache>(name) {
            BlobLoad::Loaded(cache) => {
                generator.import_cache(cache);
            }
            BlobLoad::Missing => {}
            BlobLoad::Corrupt(e) => {
                warn!(world = name, "Discarding unreadable lunagree cache: {e}");
            }
        }

        info!(
            world = name,
            seed = seed.value(),
            seething = state.seething,
            next_transition = state.ticks_until_next_transition,
            cached_cells = generator.cached_cells(),
            "Loaded world"
        );
        Self::assemble(name, seed, LunagreeManager::Active(generator), seethe, tuning)
    }

    fn assemble(
        name: &str,
        seed: WorldSeed,
        lunagree: LunagreeManager,
        seethe: SeetheManager,
        tuning: &WorldTuning,
    ) -> Self {
        let sync = SyncLayer::new(tuning.sync.clone(), seethe.state().map(|s| s.seething));
        Self {
            name: name.to_string(),
            seed,
            lunagree,
            seethe,
            rainlines: RainlineManager::new(tuning.rainline.clone()),
            sync,
        }
    }

    /// Persist seethe state and the lunagree cache. Does not flush the store.
    pub fn save(&self, store: &mut BlobStore) -> Result<(), PersistError> {
        if let Some(state) = self.seethe.state() {
            store.save(&self.name, &state)?;
        }
        if let Some(generator) = self.lunagree.generator() {
            store.save(&self.name, &generator.export_cache())?;
        }
        Ok(())
    }

    /// One world tick: advance the seethe, simulate rainlines, then send
    /// this tick's changes to every client.
    pub fn tick(&mut self) {
        self.seethe.server_tick_weather();
        self.sync
            .observe_seethe(self.seethe.state().map(|s| s.seething));

        let players = self.sync.positions();
        self.rainlines.tick(self.lunagree.generator_mut(), &players);
        let events = self.rainlines.drain_events();
        self.sync.broadcast_rainline_events(&events);

        self.sync.refresh_regions(&mut self.lunagree);
        self.sync.flush();
    }

    /// Attach a client and immediately send its catch-up.
    pub fn join(&mut self, client: ClientId, tx: mpsc::UnboundedSender<Bytes>, x: f64, z: f64) {
        let snapshots = self.rainlines.snapshots();
        self.sync.join(client, tx, (x, z), &snapshots);
        self.sync.refresh_regions(&mut self.lunagree);
        self.sync.flush();
    }

    pub fn leave(&mut self, client: ClientId) -> bool {
        self.sync.leave(client)
    }

    pub fn update_position(&mut self, client: ClientId, x: f64, z: f64) {
        self.sync.update_position(client, x, z);
    }

    /// Queue a seethe flip for the next tick.
    pub fn force_transition(&mut self) -> bool {
        match self.seethe {
            SeetheManager::Active(_) => {
                self.seethe.force_transition();
                true
            }
            SeetheManager::Inactive => false,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    pub fn is_planet(&self) -> bool {
        self.lunagree.is_active()
    }

    pub fn nearest_lunagree(&mut self, x: i32, z: i32, radius: i32) -> Option<LunagreeLocation> {
        self.lunagree.nearest_lunagree(x, z, radius)
    }

    pub fn is_seething(&self) -> bool {
        self.seethe.is_seething()
    }

    pub fn is_fluid(&self) -> bool {
        self.seethe.is_fluid()
    }

    pub fn ticks_until_next_transition(&self) -> Option<i64> {
        self.seethe.ticks_until_next_transition()
    }

    pub fn spore_fall_at(&mut self, x: i32, z: i32) -> Option<SporeType> {
        self.lunagree.spore_fall_at(x, z)
    }

    pub fn rainline_influence_at(&mut self, x: f64, z: f64) -> Option<SporeType> {
        self.rainlines.influence_at(x, z)
    }

    pub fn status(&mut self) -> WorldStatus {
        WorldStatus {
            name: self.name.clone(),
            planet: self.is_planet(),
            seething: self.seethe.state().map(|s| s.seething),
            ticks_until_next_transition: self.ticks_until_next_transition(),
            rainlines: self.rainlines.live_count(),
            clients: self.sync.client_count(),
            cached_cells: self.lunagree.generator().map_or(0, |g| g.cached_cells()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use lumar_client::ClientMirror;
    use lumar_proto::batch::decode_batch;
    use lumar_proto::packets::{ClientboundPacket, SeetheUpdate};
    use lumar_world::{PersistentByteData, SeetheState};

    fn temp_db_path() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lumar_ctx_test_{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn tuning(min: i64, max: i64) -> WorldTuning {
        WorldTuning {
            seethe: SeetheConfig::uniform(min, max),
            ..WorldTuning::default()
        }
    }

    fn decode_all(
        rx: &mut mpsc::UnboundedReceiver<Bytes>,
        world: &WorldContext,
    ) -> Vec<ClientboundPacket> {
        let mut packets = Vec::new();
        while let Ok(payload) = rx.try_recv() {
            for sub in decode_batch(payload, world.sync.batch_config()).unwrap() {
                packets.push(ClientboundPacket::decode(sub).unwrap());
            }
        }
        packets
    }

    #[test]
    fn one_solid_update_after_one_period() {
        let mut world = WorldContext::new("lumar", WorldSeed(42), true, &tuning(12_000, 24_000));
        let (tx, mut rx) = mpsc::unbounded_channel();
        world.join(ClientId(1), tx, 0.0, 0.0);
        assert!(world.is_seething());

        let period = world.ticks_until_next_transition().unwrap();
        assert!((12_000..=24_000).contains(&period));

        let mut solid_updates = 0;
        let mut fluid_updates = 0;
        for _ in 0..period {
            world.tick();
            for packet in decode_all(&mut rx, &world) {
                match packet {
                    ClientboundPacket::Seethe(SeetheUpdate { state: false }) => solid_updates += 1,
                    ClientboundPacket::Seethe(SeetheUpdate { state: true }) => fluid_updates += 1,
                    _ => {}
                }
            }
        }
        assert!(!world.is_seething());
        assert!(!world.is_fluid());
        assert_eq!(solid_updates, 1);
        // Only the join catch-up.
        assert_eq!(fluid_updates, 1);
    }

    #[test]
    fn non_planet_world_is_inert() {
        let mut world = WorldContext::new("overworld", WorldSeed(42), false, &WorldTuning::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        world.join(ClientId(1), tx, 0.0, 0.0);
        for _ in 0..100 {
            world.tick();
        }
        assert!(!world.is_seething());
        assert!(world.is_fluid());
        assert_eq!(world.nearest_lunagree(0, 0, 4), None);
        assert_eq!(world.spore_fall_at(0, 0), None);
        assert!(!world.force_transition());
        assert!(decode_all(&mut rx, &world).is_empty());
        assert_eq!(world.status().rainlines, 0);
    }

    #[test]
    fn client_mirror_tracks_world() {
        let mut world = WorldContext::new("lumar", WorldSeed(42), true, &tuning(5, 5));
        let (tx, mut rx) = mpsc::unbounded_channel();
        world.join(ClientId(1), tx, 0.0, 0.0);

        let mut mirror = ClientMirror::new();
        for _ in 0..12 {
            world.tick();
        }
        while let Ok(payload) = rx.try_recv() {
            mirror
                .handle_batch(payload, world.sync.batch_config())
                .unwrap();
        }
        assert_eq!(mirror.is_seething(), world.is_seething());
        assert_eq!(
            mirror.lunagree_count(),
            world
                .lunagree
                .lunagrees_in_area(0, 0, SyncConfig::default().view_radius_blocks)
                .len()
        );
        assert_eq!(mirror.rainline_count(), world.status().rainlines);
    }

    #[test]
    fn forced_transition_broadcasts_next_tick() {
        let mut world = WorldContext::new("lumar", WorldSeed(1), true, &tuning(1000, 2000));
        let (tx, mut rx) = mpsc::unbounded_channel();
        world.join(ClientId(1), tx, 0.0, 0.0);
        decode_all(&mut rx, &world);

        assert!(world.force_transition());
        assert!(world.is_seething());
        world.tick();
        assert!(!world.is_seething());
        assert!(decode_all(&mut rx, &world)
            .contains(&ClientboundPacket::Seethe(SeetheUpdate { state: false })));
    }

    #[test]
    fn save_and_reload() {
        let path = temp_db_path();
        let mut store = BlobStore::open(&path).unwrap();
        let t = tuning(100, 300);

        let mut world = WorldContext::new("lumar", WorldSeed(9), true, &t);
        world.nearest_lunagree(0, 0, 3);
        for _ in 0..450 {
            world.tick();
        }
        world.save(&mut store).unwrap();
        store.flush().unwrap();

        let mut reloaded = WorldContext::load("lumar", WorldSeed(9), true, &t, &mut store);
        assert_eq!(reloaded.seethe.state(), world.seethe.state());
        assert_eq!(reloaded.status().cached_cells, world.status().cached_cells);
        for _ in 0..500 {
            world.tick();
            reloaded.tick();
            assert_eq!(reloaded.is_seething(), world.is_seething());
        }
        std::fs::remove_dir_all(&path).ok();
    }

    #[test]
    fn corrupt_blob_yields_fresh_state() {
        let path = temp_db_path();
        let mut store = BlobStore::open(&path).unwrap();
        store
            .put_raw("lumar", SeetheState::BLOB_NAME, b"LUMR garbage")
            .unwrap();
        store
            .put_raw("lumar", LunagreeCache::BLOB_NAME, &[0u8; 3])
            .unwrap();

        let t = tuning(100, 300);
        let world = WorldContext::load("lumar", WorldSeed(9), true, &t, &mut store);
        let fresh = WorldContext::new("lumar", WorldSeed(9), true, &t);
        assert_eq!(world.seethe.state(), fresh.seethe.state());
        std::fs::remove_dir_all(&path).ok();
    }

    #[test]
    fn worlds_do_not_share_state() {
        let path = temp_db_path();
        let mut store = BlobStore::open(&path).unwrap();
        let t = tuning(100, 300);
        let mut a = WorldContext::new("a", WorldSeed(9), true, &t);
        a.force_transition();
        a.tick();
        a.save(&mut store).unwrap();

        let b = WorldContext::load("b", WorldSeed(9), true, &t, &mut store);
        assert!(b.is_seething());
        assert!(!a.is_seething());
        std::fs::remove_dir_all(&path).ok();
    }

    #[test]
    fn queries_delegate() {
        let mut world = WorldContext::new("lumar", WorldSeed(42), true, &WorldTuning::default());
        let nearest = world.nearest_lunagree(0, 0, 2);
        let mut fresh = LunagreeGenerator::new(WorldSeed(42), LunagreeConfig::default());
        assert_eq!(nearest, fresh.nearest_lunagree(0, 0, 2));
        if let Some(l) = nearest {
            assert_eq!(world.spore_fall_at(l.block_x, l.block_z), l.spore());
        }
        assert_eq!(world.rainline_influence_at(0.0, 0.0), None);
    }
}
