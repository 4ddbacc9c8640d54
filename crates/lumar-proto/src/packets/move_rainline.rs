//! MoveRainline (0x11) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{read_f32_le, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarUInt64;

/// Absolute rainline position update.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRainline {
    pub runtime_id: u64,
    pub x: f32,
    pub z: f32,
}

impl ProtoEncode for MoveRainline {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt64(self.runtime_id).proto_encode(buf);
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.z);
    }
}

impl ProtoDecode for MoveRainline {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            runtime_id: VarUInt64::proto_decode(buf)?.0,
            x: read_f32_le(buf)?,
            z: read_f32_le(buf)?,
        })
    }
}
