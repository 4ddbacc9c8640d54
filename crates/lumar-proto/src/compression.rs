//! Batch compression for clientbound sync payloads.

use std::io::{Read, Write};

use crate::error::ProtoError;

/// Compression algorithms a client can negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    Zlib,
    Snappy,
    None,
}

impl CompressionAlgorithm {
    pub fn from_byte(v: u8) -> Result<Self, ProtoError> {
        match v {
            0x00 => Ok(Self::Zlib),
            0x01 => Ok(Self::Snappy),
            0xFF => Ok(Self::None),
            other => Err(ProtoError::UnknownCompression(other)),
        }
    }

    /// Parse a config name: `zlib`, `snappy` or `none`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "zlib" => Some(Self::Zlib),
            "snappy" => Some(Self::Snappy),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Zlib => 0x00,
            Self::Snappy => 0x01,
            Self::None => 0xFF,
        }
    }
}

/// Compress `data` with `algorithm`. `level` only applies to zlib.
pub fn compress(
    data: &[u8],
    algorithm: CompressionAlgorithm,
    level: u32,
) -> Result<Vec<u8>, ProtoError> {
    match algorithm {
        CompressionAlgorithm::Zlib => {
            let mut encoder = flate2::write::DeflateEncoder::new(
                Vec::with_capacity(data.len() / 2),
                flate2::Compression::new(level),
            );
            encoder
                .write_all(data)
                .map_err(|e| ProtoError::CompressError(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| ProtoError::CompressError(e.to_string()))
        }
        CompressionAlgorithm::Snappy => snap::raw::Encoder::new()
            .compress_vec(data)
            .map_err(|e| ProtoError::CompressError(e.to_string())),
        CompressionAlgorithm::None => Ok(data.to_vec()),
    }
}

/// Decompress `data` that was produced by [`compress`] with the same algorithm.
pub fn decompress(data: &[u8], algorithm: CompressionAlgorithm) -> Result<Vec<u8>, ProtoError> {
    match algorithm {
        CompressionAlgorithm::Zlib => {
            let mut output = Vec::new();
            flate2::read::DeflateDecoder::new(data)
                .read_to_end(&mut output)
                .map_err(|e| ProtoError::DecompressError(e.to_string()))?;
            Ok(output)
        }
        CompressionAlgorithm::Snappy => snap::raw::Decoder::new()
            .decompress_vec(data)
            .map_err(|e| ProtoError::DecompressError(e.to_string())),
        CompressionAlgorithm::None => Ok(data.to_vec()),
    }
}
