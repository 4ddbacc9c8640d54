//! Lumar world state: tide point placement, the seethe cycle and persisted blobs.

pub mod blob;
pub mod error;
pub mod lunagree;
pub mod seed;
pub mod seethe;
pub mod spore;
pub mod storage;

pub use blob::PersistentByteData;
pub use error::PersistError;
pub use lunagree::{LunagreeConfig, LunagreeGenerator, LunagreeLocation, LunagreeManager};
pub use seed::WorldSeed;
pub use seethe::{SeaSurface, SeetheConfig, SeetheManager, SeetheSchedule, SeetheState};
pub use spore::SporeType;
pub use storage::{BlobLoad, BlobStore};
