//! Lumar sync protocol: wire types, sub-packet framing and clientbound packets.

pub mod batch;
pub mod codec;
pub mod compression;
pub mod error;
pub mod packets;
pub mod types;
