//! Per-world client sync: seethe diffs, lunagree regions and rainline events.
//!
//! Packets for a client accumulate during a tick and are flushed as a single
//! batch into the client's outbound channel. The transport on the other end
//! of the channel is not our concern; a closed channel is ignored.

use std::collections::HashMap;

use bytes::Bytes;
use lumar_game::{RainlineEvent, RainlineSnapshot};
use lumar_proto::batch::{encode_batch, encode_sub_packet, BatchConfig};
use lumar_proto::codec::ProtoEncode;
use lumar_proto::compression::CompressionAlgorithm;
use lumar_proto::packets::lunagree_batch::MAX_BATCH_ENTRIES;
use lumar_proto::packets::{
    id, AddRainline, LunagreeBatch, LunagreeEntry, MoveRainline, RemoveRainline, SeetheUpdate,
};
use lumar_world::LunagreeManager;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Sync tuning, read from the `[sync]` config section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Lunagrees within this many blocks of a client are pushed to it.
    pub view_radius_blocks: i32,
    /// Cells a client must move on either axis before its region is refreshed.
    pub refresh_cells: i32,
    /// Batch compression: `zlib`, `snappy` or `none`.
    pub compression: String,
    pub compression_threshold: usize,
    pub compression_level: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            view_radius_blocks: 512,
            refresh_cells: 1,
            compression: "zlib".into(),
            compression_threshold: 256,
            compression_level: 7,
        }
    }
}

impl SyncConfig {
    pub fn batch_config(&self) -> BatchConfig {
        let compression = CompressionAlgorithm::from_name(&self.compression).unwrap_or_else(|| {
            warn!("Unknown sync compression {:?}, using zlib", self.compression);
            CompressionAlgorithm::Zlib
        });
        BatchConfig {
            compression,
            compression_level: self.compression_level,
            compression_threshold: self.compression_threshold,
            compression_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

/// One connected client in a world.
pub struct ClientSession {
    tx: mpsc::UnboundedSender<Bytes>,
    position: (f64, f64),
    /// Cell the last lunagree batch was centered on.
    region: Option<(i32, i32)>,
    pending: Vec<Bytes>,
}

impl ClientSession {
    fn queue(&mut self, packet_id: u32, packet: &impl ProtoEncode) {
        self.pending.push(encode_sub_packet(packet_id, packet));
    }
}

pub struct SyncLayer {
    config: SyncConfig,
    batch: BatchConfig,
    clients: HashMap<ClientId, ClientSession>,
    /// Last seethe state broadcast to the world; `None` if the world never seethes.
    last_seethe: Option<bool>,
}

impl SyncLayer {
    pub fn new(config: SyncConfig, initial_seethe: Option<bool>) -> Self {
        let batch = config.batch_config();
        Self {
            config,
            batch,
            clients: HashMap::new(),
            last_seethe: initial_seethe,
        }
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.batch
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn positions(&self) -> Vec<(f64, f64)> {
        let mut ids: Vec<&ClientId> = self.clients.keys().collect();
        ids.sort();
        ids.into_iter().map(|id| self.clients[id].position).collect()
    }

    /// Register a client and queue its catch-up: current seethe state and
    /// every live rainline. Its lunagree region is pushed on the next refresh.
    ///
    /// The session lives until [`SyncLayer::leave`]. A closed channel does not
    /// remove it, so the transport must call `leave` on disconnect or the stale
    /// position keeps activating lunagrees.
    pub fn join(
        &mut self,
        client: ClientId,
        tx: mpsc::UnboundedSender<Bytes>,
        position: (f64, f64),
        rainlines: &[RainlineSnapshot],
    ) {
        let mut session = ClientSession {
            tx,
            position,
            region: None,
            pending: Vec::new(),
        };
        if let Some(state) = self.last_seethe {
            let update = SeetheUpdate { state };
            session.queue(update.packet_id(), &update);
        }
        for r in rainlines {
            session.queue(
                id::ADD_RAINLINE,
                &AddRainline {
                    runtime_id: r.runtime_id,
                    x: r.x as f32,
                    z: r.z as f32,
                    spore_id: r.spore.id(),
                    radius: r.radius,
                },
            );
        }
        debug!(client = client.0, rainlines = rainlines.len(), "Client joined sync");
        self.clients.insert(client, session);
    }

    pub fn leave(&mut self, client: ClientId) -> bool {
        self.clients.remove(&client).is_some()
    }

    pub fn update_position(&mut self, client: ClientId, x: f64, z: f64) {
        if let Some(session) = self.clients.get_mut(&client) {
            session.position = (x, z);
        }
    }

    fn queue_all(&mut self, packet_id: u32, packet: &impl ProtoEncode) {
        let encoded = encode_sub_packet(packet_id, packet);
        for session in self.clients.values_mut() {
            session.pending.push(encoded.clone());
        }
    }

    /// Broadcast the seethe state if it changed since the last broadcast.
    /// Returns whether an update was queued.
    pub fn observe_seethe(&mut self, seething: Option<bool>) -> bool {
        let Some(state) = seething else {
            return false;
        };
        if self.last_seethe == Some(state) {
            return false;
        }
        self.last_seethe = Some(state);
        let update = SeetheUpdate { state };
        self.queue_all(update.packet_id(), &update);
        true
    }

    pub fn broadcast_rainline_events(&mut self, events: &[RainlineEvent]) {
        for event in events {
            match *event {
                RainlineEvent::Spawned {
                    runtime_id,
                    x,
                    z,
                    spore,
                    radius,
                } => self.queue_all(
                    id::ADD_RAINLINE,
                    &AddRainline {
                        runtime_id,
                        x: x as f32,
                        z: z as f32,
                        spore_id: spore.id(),
                        radius,
                    },
                ),
                RainlineEvent::Moved { runtime_id, x, z } => self.queue_all(
                    id::MOVE_RAINLINE,
                    &MoveRainline {
                        runtime_id,
                        x: x as f32,
                        z: z as f32,
                    },
                ),
                RainlineEvent::Removed { runtime_id } => {
                    self.queue_all(id::REMOVE_RAINLINE, &RemoveRainline { runtime_id })
                }
            }
        }
    }

    /// Push lunagree batches to clients that joined or moved far enough.
    pub fn refresh_regions(&mut self, lunagrees: &mut LunagreeManager) {
        let Some(generator) = lunagrees.generator_mut() else {
            return;
        };
        let threshold = self.config.refresh_cells.max(1);
        let radius = self.config.view_radius_blocks;
        for (client, session) in &mut self.clients {
            let (x, z) = (session.position.0.floor() as i32, session.position.1.floor() as i32);
            let cell = (generator.cell_of(x), generator.cell_of(z));
            let stale = match session.region {
                None => true,
                Some((rx, rz)) => {
                    (cell.0 as i64 - rx as i64).abs() >= threshold as i64
                        || (cell.1 as i64 - rz as i64).abs() >= threshold as i64
                }
            };
            if !stale {
                continue;
            }
            session.region = Some(cell);
            let entries: Vec<LunagreeEntry> = generator
                .lunagrees_in_area(x, z, radius)
                .into_iter()
                .take(MAX_BATCH_ENTRIES)
                .map(|l| LunagreeEntry {
                    x: l.block_x,
                    z: l.block_z,
                    spore_id: l.spore_id,
                })
                .collect();
            debug!(client = client.0, cell = ?cell, count = entries.len(), "Lunagree region refresh");
            session.queue(id::LUNAGREE_BATCH, &LunagreeBatch { entries });
        }
    }

    /// Send every client's pending packets as one batch.
    pub fn flush(&mut self) {
        for (client, session) in &mut self.clients {
            if session.pending.is_empty() {
                continue;
            }
            let packets = std::mem::take(&mut session.pending);
            match encode_batch(&packets, &self.batch) {
                Ok(payload) => {
                    if session.tx.send(payload).is_err() {
                        trace!(client = client.0, "Dropping batch for closed channel");
                    }
                }
                Err(e) => warn!(client = client.0, "Failed to encode sync batch: {e}"),
            }
        }
    }
}
