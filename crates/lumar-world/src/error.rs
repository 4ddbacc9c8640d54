//! Persistence error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("blob too short: {len} bytes, need at least {needed}")]
    TooShort { len: usize, needed: usize },

    #[error("bad magic bytes")]
    BadMagic,

    #[error("unsupported envelope version {0}")]
    UnsupportedEnvelope(u16),

    #[error("blob `{blob}` has version {found}, this build reads up to {supported}")]
    UnsupportedVersion {
        blob: &'static str,
        found: u16,
        supported: u16,
    },

    #[error("payload length mismatch: header says {declared}, blob has {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("checksum mismatch (expected {expected:#010X}, got {computed:#010X})")]
    ChecksumMismatch { expected: u32, computed: u32 },

    #[error("payload truncated while reading {0}")]
    Truncated(&'static str),

    #[error("{0} unread bytes after payload")]
    TrailingBytes(usize),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("storage error: {0}")]
    Storage(String),
}
