//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("VarInt encoding error: {0}")]
    VarInt(#[from] crate::types::VarIntError),

    #[error("decompression error: {0}")]
    DecompressError(String),

    #[error("compression error: {0}")]
    CompressError(String),

    #[error("unknown compression algorithm: 0x{0:02X}")]
    UnknownCompression(u8),

    #[error("packet batch is empty")]
    EmptyBatch,

    #[error("unknown packet id: 0x{0:02X}")]
    UnknownPacketId(u32),

    #[error("list too long: {len} entries (limit: {limit})")]
    ListTooLong { len: usize, limit: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),
}
