//! Clientbound sync packets.

pub mod add_rainline;
pub mod lunagree_batch;
pub mod move_rainline;
pub mod remove_rainline;
pub mod seethe_update;

pub use add_rainline::AddRainline;
pub use lunagree_batch::{LunagreeBatch, LunagreeEntry};
pub use move_rainline::MoveRainline;
pub use remove_rainline::RemoveRainline;
pub use seethe_update::SeetheUpdate;

use bytes::Bytes;

use crate::batch::decode_sub_packet;
use crate::codec::ProtoDecode;
use crate::error::ProtoError;

/// Sync packet IDs.
pub mod id {
    pub const SEETHE_START: u32 = 0x01;
    pub const SEETHE_STOP: u32 = 0x02;
    pub const LUNAGREE_BATCH: u32 = 0x03;
    pub const ADD_RAINLINE: u32 = 0x10;
    pub const MOVE_RAINLINE: u32 = 0x11;
    pub const REMOVE_RAINLINE: u32 = 0x12;
}

/// Any packet the server may send to a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientboundPacket {
    Seethe(SeetheUpdate),
    LunagreeBatch(LunagreeBatch),
    AddRainline(AddRainline),
    MoveRainline(MoveRainline),
    RemoveRainline(RemoveRainline),
}

impl ClientboundPacket {
    /// Decode one sub-packet (`VarUInt32(id) + body`).
    pub fn decode(data: Bytes) -> Result<Self, ProtoError> {
        let (packet_id, mut body) = decode_sub_packet(data)?;
        let packet = match packet_id {
            id::SEETHE_START | id::SEETHE_STOP => {
                Self::Seethe(SeetheUpdate::from_packet_id(packet_id)?)
            }
            id::LUNAGREE_BATCH => Self::LunagreeBatch(LunagreeBatch::proto_decode(&mut body)?),
            id::ADD_RAINLINE => Self::AddRainline(AddRainline::proto_decode(&mut body)?),
            id::MOVE_RAINLINE => Self::MoveRainline(MoveRainline::proto_decode(&mut body)?),
            id::REMOVE_RAINLINE => Self::RemoveRainline(RemoveRainline::proto_decode(&mut body)?),
            other => return Err(ProtoError::UnknownPacketId(other)),
        };
        Ok(packet)
    }
}
