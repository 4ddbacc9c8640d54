//! AddRainline (0x10) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{read_f32_le, read_u8, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarUInt64;

/// A rainline entered the world.
#[derive(Debug, Clone, PartialEq)]
pub struct AddRainline {
    pub runtime_id: u64,
    pub x: f32,
    pub z: f32,
    pub spore_id: u8,
    /// Influence radius in blocks.
    pub radius: f32,
}

impl ProtoEncode for AddRainline {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt64(self.runtime_id).proto_encode(buf);
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.z);
        buf.put_u8(self.spore_id);
        buf.put_f32_le(self.radius);
    }
}

impl ProtoDecode for AddRainline {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            runtime_id: VarUInt64::proto_decode(buf)?.0,
            x: read_f32_le(buf)?,
            z: read_f32_le(buf)?,
            spore_id: read_u8(buf)?,
            radius: read_f32_le(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_layout() {
        let pkt = AddRainline {
            runtime_id: 3,
            x: 10.5,
            z: -2.0,
            spore_id: 4,
            radius: 48.0,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        // VarUInt64(1 byte) + f32 + f32 + u8 + f32
        assert_eq!(buf.len(), 1 + 4 + 4 + 1 + 4);
        assert_eq!(AddRainline::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
