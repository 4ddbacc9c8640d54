//! SeetheStart (0x01) / SeetheStop (0x02) — Server → Client.
//!
//! The state travels in the packet id; the body is empty.

use bytes::BufMut;

use crate::codec::ProtoEncode;
use crate::error::ProtoError;
use crate::packets::id;

/// Seethe state change. `state == true` means the seas are fluid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeetheUpdate {
    pub state: bool,
}

impl SeetheUpdate {
    /// Packet id carrying this state.
    pub fn packet_id(&self) -> u32 {
        if self.state {
            id::SEETHE_START
        } else {
            id::SEETHE_STOP
        }
    }

    pub fn from_packet_id(packet_id: u32) -> Result<Self, ProtoError> {
        match packet_id {
            id::SEETHE_START => Ok(Self { state: true }),
            id::SEETHE_STOP => Ok(Self { state: false }),
            other => Err(ProtoError::UnknownPacketId(other)),
        }
    }
}

impl ProtoEncode for SeetheUpdate {
    fn proto_encode(&self, _buf: &mut impl BufMut) {}
}
