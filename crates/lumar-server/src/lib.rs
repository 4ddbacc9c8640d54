//! Lumar server: configuration, per-world contexts, client sync and the tick loop pieces.

pub mod config;
pub mod server;
pub mod sync;
pub mod world_context;
