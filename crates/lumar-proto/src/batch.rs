//! Sub-packet framing and batch encoding.
//!
//! A sub-packet is `VarUInt32(packet_id) + body`. A batch is one or more
//! length-prefixed sub-packets, optionally compressed behind a one-byte
//! algorithm tag.

use std::io::Cursor;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::compression::{compress, decompress, CompressionAlgorithm};
use crate::error::ProtoError;
use crate::types::VarUInt32;

/// Configuration for the batch codec.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Algorithm used for batches at or above the threshold.
    pub compression: CompressionAlgorithm,
    /// Compression level (0-9 for zlib). Ignored for snappy/none.
    pub compression_level: u32,
    /// Batches smaller than this are tagged `None` and sent raw.
    pub compression_threshold: usize,
    /// Whether the algorithm tag is present at all.
    pub compression_enabled: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            compression: CompressionAlgorithm::Zlib,
            compression_level: 7,
            compression_threshold: 256,
            compression_enabled: true,
        }
    }
}

/// Encode a packet body behind its id.
pub fn encode_sub_packet(packet_id: u32, packet: &impl ProtoEncode) -> Bytes {
    let mut buf = BytesMut::new();
    VarUInt32(packet_id).proto_encode(&mut buf);
    packet.proto_encode(&mut buf);
    buf.freeze()
}

/// Split a sub-packet into its id and body.
pub fn decode_sub_packet(mut data: Bytes) -> Result<(u32, Bytes), ProtoError> {
    let id = VarUInt32::proto_decode(&mut data)?.0;
    Ok((id, data))
}

/// Encode sub-packets into a single batch payload.
pub fn encode_batch(packets: &[Bytes], config: &BatchConfig) -> Result<Bytes, ProtoError> {
    let mut batch = BytesMut::new();
    for packet in packets {
        VarUInt32(packet.len() as u32).proto_encode(&mut batch);
        batch.put_slice(packet);
    }

    if !config.compression_enabled {
        return Ok(batch.freeze());
    }

    let algorithm = if batch.len() < config.compression_threshold {
        CompressionAlgorithm::None
    } else {
        config.compression
    };
    let compressed = compress(&batch, algorithm, config.compression_level)?;

    let mut output = BytesMut::with_capacity(1 + compressed.len());
    output.put_u8(algorithm.to_byte());
    output.put_slice(&compressed);
    Ok(output.freeze())
}

/// Decode a batch payload into its sub-packets.
pub fn decode_batch(data: Bytes, config: &BatchConfig) -> Result<Vec<Bytes>, ProtoError> {
    let raw = if config.compression_enabled {
        if data.is_empty() {
            return Err(ProtoError::EmptyBatch);
        }
        let algorithm = CompressionAlgorithm::from_byte(data[0])?;
        Bytes::from(decompress(&data[1..], algorithm)?)
    } else {
        data
    };

    let mut cursor = Cursor::new(&raw[..]);
    let mut packets = Vec::new();
    while cursor.has_remaining() {
        let len = VarUInt32::proto_decode(&mut cursor)?.0 as usize;
        if cursor.remaining() < len {
            return Err(ProtoError::BufferTooShort {
                needed: len,
                remaining: cursor.remaining(),
            });
        }
        let start = cursor.position() as usize;
        packets.push(raw.slice(start..start + len));
        cursor.set_position((start + len) as u64);
    }
    trace!(count = packets.len(), raw_len = raw.len(), "Decoded batch");
    Ok(packets)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Raw(&'static [u8]);

    impl ProtoEncode for Raw {
        fn proto_encode(&self, buf: &mut impl BufMut) {
            buf.put_slice(self.0);
        }
    }

    #[test]
    fn sub_packet_id_and_body() {
        let encoded = encode_sub_packet(0x03, &Raw(b"abc"));
        assert_eq!(&encoded[..], &[0x03, b'a', b'b', b'c']);
        let (id, body) = decode_sub_packet(encoded).unwrap();
        assert_eq!(id, 0x03);
        assert_eq!(&body[..], b"abc");
    }

    #[test]
    fn small_batch_is_tagged_uncompressed() {
        let config = BatchConfig::default();
        let pkt = encode_sub_packet(0x01, &Raw(b""));
        let encoded = encode_batch(std::slice::from_ref(&pkt), &config).unwrap();
        assert_eq!(encoded[0], 0xFF);
        let decoded = decode_batch(encoded, &config).unwrap();
        assert_eq!(decoded, vec![pkt]);
    }

    #[test]
    fn large_batch_is_compressed() {
        let config = BatchConfig {
            compression_threshold: 0,
            ..BatchConfig::default()
        };
        let packets: Vec<Bytes> = (0..8)
            .map(|_| encode_sub_packet(0x03, &Raw(b"lunagree batch body lunagree batch body")))
            .collect();
        let encoded = encode_batch(&packets, &config).unwrap();
        assert_eq!(encoded[0], 0x00);
        let decoded = decode_batch(encoded, &config).unwrap();
        assert_eq!(decoded, packets);
    }

    #[test]
    fn uncompressed_mode_has_no_tag() {
        let config = BatchConfig {
            compression_enabled: false,
            ..BatchConfig::default()
        };
        let pkt = encode_sub_packet(0x02, &Raw(b"x"));
        let encoded = encode_batch(std::slice::from_ref(&pkt), &config).unwrap();
        assert_eq!(encoded[0], pkt.len() as u8);
        assert_eq!(decode_batch(encoded, &config).unwrap(), vec![pkt]);
    }

    #[test]
    fn empty_compressed_batch_errors() {
        let config = BatchConfig::default();
        assert!(matches!(
            decode_batch(Bytes::new(), &config),
            Err(ProtoError::EmptyBatch)
        ));
    }

    #[test]
    fn truncated_batch_errors() {
        let config = BatchConfig {
            compression_enabled: false,
            ..BatchConfig::default()
        };
        assert!(decode_batch(Bytes::from_static(&[0x05, 0x01]), &config).is_err());
    }
}
