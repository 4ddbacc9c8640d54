//! Client-side mirror of Lumar world state.

pub mod mirror;

pub use mirror::{ClientMirror, RainlineView};
