//! Self-describing binary envelope for persisted manager state.
//!
//! Layout (16-byte header, little-endian):
//!   [0..4]   magic "LUMR"
//!   [4..6]   envelope version (u16)
//!   [6..8]   blob version (u16), owned by the implementing type
//!   [8..12]  payload length (u32)
//!   [12..16] xxHash32 of the payload
//!   [16..]   payload

use bytes::{Buf, BufMut, Bytes, BytesMut};
use xxhash_rust::xxh32::xxh32;

use crate::error::PersistError;

/// Magic bytes identifying a Lumar state blob.
pub const MAGIC: [u8; 4] = *b"LUMR";

/// Size of the envelope header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Current envelope layout version.
pub const ENVELOPE_VERSION: u16 = 1;

const XXHASH_SEED: u32 = 0;

/// State that survives restarts as one opaque named blob per world.
pub trait PersistentByteData: Sized {
    /// Name of the blob in the store, unique per world.
    const BLOB_NAME: &'static str;
    /// Payload layout version written by this build.
    const BLOB_VERSION: u16;

    fn write_payload(&self, buf: &mut BytesMut);

    /// Decode a payload written with `version` (never newer than `BLOB_VERSION`).
    fn read_payload(buf: &mut Bytes, version: u16) -> Result<Self, PersistError>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut payload = BytesMut::new();
        self.write_payload(&mut payload);
        wrap(Self::BLOB_VERSION, &payload)
    }

    fn from_bytes(data: &[u8]) -> Result<Self, PersistError> {
        let (version, payload) = unwrap(data)?;
        if version > Self::BLOB_VERSION {
            return Err(PersistError::UnsupportedVersion {
                blob: Self::BLOB_NAME,
                found: version,
                supported: Self::BLOB_VERSION,
            });
        }
        let mut buf = Bytes::copy_from_slice(payload);
        let value = Self::read_payload(&mut buf, version)?;
        if buf.has_remaining() {
            return Err(PersistError::TrailingBytes(buf.remaining()));
        }
        Ok(value)
    }
}

/// Prepend the envelope header to a payload.
pub fn wrap(blob_version: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.put_slice(&MAGIC);
    out.put_u16_le(ENVELOPE_VERSION);
    out.put_u16_le(blob_version);
    out.put_u32_le(payload.len() as u32);
    out.put_u32_le(xxh32(payload, XXHASH_SEED));
    out.put_slice(payload);
    out
}

/// Validate the envelope and return `(blob_version, payload)`.
pub fn unwrap(data: &[u8]) -> Result<(u16, &[u8]), PersistError> {
    if data.len() < HEADER_SIZE {
        return Err(PersistError::TooShort {
            len: data.len(),
            needed: HEADER_SIZE,
        });
    }
    if data[..4] != MAGIC {
        return Err(PersistError::BadMagic);
    }

    let mut header = &data[4..HEADER_SIZE];
    let envelope_version = header.get_u16_le();
    if envelope_version != ENVELOPE_VERSION {
        return Err(PersistError::UnsupportedEnvelope(envelope_version));
    }
    let blob_version = header.get_u16_le();
    let declared = header.get_u32_le() as usize;
    let expected = header.get_u32_le();

    let payload = &data[HEADER_SIZE..];
    if payload.len() != declared {
        return Err(PersistError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != expected {
        return Err(PersistError::ChecksumMismatch { expected, computed });
    }
    Ok((blob_version, payload))
}

// ─── Payload readers ────────────────────────────────────────────────────────

pub(crate) fn read_u8(buf: &mut Bytes, what: &'static str) -> Result<u8, PersistError> {
    if buf.remaining() < 1 {
        return Err(PersistError::Truncated(what));
    }
    Ok(buf.get_u8())
}

pub(crate) fn read_i32(buf: &mut Bytes, what: &'static str) -> Result<i32, PersistError> {
    if buf.remaining() < 4 {
        return Err(PersistError::Truncated(what));
    }
    Ok(buf.get_i32_le())
}

pub(crate) fn read_u32(buf: &mut Bytes, what: &'static str) -> Result<u32, PersistError> {
    if buf.remaining() < 4 {
        return Err(PersistError::Truncated(what));
    }
    Ok(buf.get_u32_le())
}

pub(crate) fn read_i64(buf: &mut Bytes, what: &'static str) -> Result<i64, PersistError> {
    if buf.remaining() < 8 {
        return Err(PersistError::Truncated(what));
    }
    Ok(buf.get_i64_le())
}

pub(crate) fn read_u64(buf: &mut Bytes, what: &'static str) -> Result<u64, PersistError> {
    if buf.remaining() < 8 {
        return Err(PersistError::Truncated(what));
    }
    Ok(buf.get_u64_le())
}

pub(crate) fn read_bool(buf: &mut Bytes, what: &'static str) -> Result<bool, PersistError> {
    match read_u8(buf, what)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(PersistError::InvalidValue(format!("{what}: {other} is not a bool"))),
    }
}
