//! LunagreeBatch (0x03) — Server → Client.
//!
//! Tide points inside the client's visibility region.

use bytes::{Buf, BufMut};

use crate::codec::{read_u8, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{VarInt, VarUInt32};

/// Upper bound on entries accepted in one batch.
pub const MAX_BATCH_ENTRIES: usize = 4096;

/// One tide point: block coordinates and spore id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LunagreeEntry {
    pub x: i32,
    pub z: i32,
    pub spore_id: u8,
}

/// LunagreeBatch packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LunagreeBatch {
    pub entries: Vec<LunagreeEntry>,
}

impl ProtoEncode for LunagreeBatch {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.entries.len() as u32).proto_encode(buf);
        for entry in &self.entries {
            VarInt(entry.x).proto_encode(buf);
            VarInt(entry.z).proto_encode(buf);
            buf.put_u8(entry.spore_id);
        }
    }
}

impl ProtoDecode for LunagreeBatch {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let len = VarUInt32::proto_decode(buf)?.0 as usize;
        if len > MAX_BATCH_ENTRIES {
            return Err(ProtoError::ListTooLong {
                len,
                limit: MAX_BATCH_ENTRIES,
            });
        }
        let mut entries = Vec::with_capacity(len);
        for _ in 0..len {
            let x = VarInt::proto_decode(buf)?.0;
            let z = VarInt::proto_decode(buf)?.0;
            let spore_id = read_u8(buf)?;
            entries.push(LunagreeEntry { x, z, spore_id });
        }
        Ok(Self { entries })
    }
}
