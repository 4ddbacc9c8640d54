//! Rainline entities and their per-world manager.

pub mod components;
pub mod rainline;

pub use rainline::{RainlineConfig, RainlineEvent, RainlineManager, RainlineSnapshot};
