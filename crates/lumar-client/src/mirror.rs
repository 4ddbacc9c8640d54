//! Read-only client view of Lumar state, fed by decoded server packets.

use std::collections::HashMap;

use bytes::Bytes;
use lumar_proto::batch::{decode_batch, BatchConfig};
use lumar_proto::error::ProtoError;
use lumar_proto::packets::{AddRainline, ClientboundPacket, LunagreeBatch};
use tracing::{debug, trace};

/// Client-side view of one rainline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainlineView {
    pub x: f32,
    pub z: f32,
    pub spore_id: u8,
    pub radius: f32,
}

impl From<&AddRainline> for RainlineView {
    fn from(pkt: &AddRainline) -> Self {
        Self {
            x: pkt.x,
            z: pkt.z,
            spore_id: pkt.spore_id,
            radius: pkt.radius,
        }
    }
}

#[derive(Debug, Default)]
pub struct ClientMirror {
    /// `None` until the server has told us anything about the seethe.
    seething: Option<bool>,
    lunagrees: HashMap<(i32, i32), u8>,
    rainlines: HashMap<u64, RainlineView>,
}

impl ClientMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a batch payload and apply every packet in it.
    pub fn handle_batch(&mut self, data: Bytes, config: &BatchConfig) -> Result<usize, ProtoError> {
        let packets = decode_batch(data, config)?;
        let count = packets.len();
        for packet in packets {
            self.handle_packet(packet)?;
        }
        Ok(count)
    }

    /// Decode and apply one sub-packet.
    pub fn handle_packet(&mut self, data: Bytes) -> Result<(), ProtoError> {
        let packet = ClientboundPacket::decode(data)?;
        self.apply(packet);
        Ok(())
    }

    pub fn apply(&mut self, packet: ClientboundPacket) {
        match packet {
            ClientboundPacket::Seethe(update) => {
                debug!(seething = update.state, "Seethe update");
                self.seething = Some(update.state);
            }
            ClientboundPacket::LunagreeBatch(LunagreeBatch { entries }) => {
                trace!(count = entries.len(), "Lunagree batch");
                // A batch is the full view around the client's current region.
                self.lunagrees.clear();
                for entry in entries {
                    self.lunagrees.insert((entry.x, entry.z), entry.spore_id);
                }
            }
            ClientboundPacket::AddRainline(pkt) => {
                self.rainlines.insert(pkt.runtime_id, RainlineView::from(&pkt));
            }
            ClientboundPacket::MoveRainline(pkt) => match self.rainlines.get_mut(&pkt.runtime_id) {
                Some(view) => {
                    view.x = pkt.x;
                    view.z = pkt.z;
                }
                None => trace!(runtime_id = pkt.runtime_id, "Move for unknown rainline"),
            },
            ClientboundPacket::RemoveRainline(pkt) => {
                self.rainlines.remove(&pkt.runtime_id);
            }
        }
    }

    pub fn is_seething(&self) -> bool {
        self.seething.unwrap_or(false)
    }

    /// Seas are fluid unless the server said the seethe has stilled.
    pub fn is_fluid(&self) -> bool {
        self.seething.unwrap_or(true)
    }

    pub fn lunagree_count(&self) -> usize {
        self.lunagrees.len()
    }

    pub fn spore_at_lunagree(&self, x: i32, z: i32) -> Option<u8> {
        self.lunagrees.get(&(x, z)).copied()
    }

    /// Closest known lunagree as `(x, z, spore_id)`.
    pub fn nearest_known_lunagree(&self, x: i32, z: i32) -> Option<(i32, i32, u8)> {
        self.lunagrees
            .iter()
            .map(|(&(lx, lz), &spore)| {
                let dx = lx as i64 - x as i64;
                let dz = lz as i64 - z as i64;
                (dx * dx + dz * dz, (lx, lz), spore)
            })
            .min_by_key(|&(d, key, _)| (d, key))
            .map(|(_, (lx, lz), spore)| (lx, lz, spore))
    }

    pub fn rainline(&self, runtime_id: u64) -> Option<&RainlineView> {
        self.rainlines.get(&runtime_id)
    }

    pub fn rainline_count(&self) -> usize {
        self.rainlines.len()
    }

    /// Spore id dropped at `(x, z)` by the closest covering rainline.
    pub fn rainline_influence_at(&self, x: f32, z: f32) -> Option<u8> {
        self.rainlines
            .values()
            .filter_map(|r| {
                let dx = r.x - x;
                let dz = r.z - z;
                let d = dx * dx + dz * dz;
                (d <= r.radius * r.radius).then_some((d, r.spore_id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, spore)| spore)
    }

    /// Drop everything, e.g. on world change.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
