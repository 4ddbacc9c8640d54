//! RemoveRainline (0x12) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarUInt64;

/// A rainline left the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveRainline {
    pub runtime_id: u64,
}

impl ProtoEncode for RemoveRainline {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt64(self.runtime_id).proto_encode(buf);
    }
}

impl ProtoDecode for RemoveRainline {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            runtime_id: VarUInt64::proto_decode(buf)?.0,
        })
    }
}
