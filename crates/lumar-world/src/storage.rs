//! LevelDB-backed store for per-world Lumar blobs.
//!
//! One value per `(world, blob)` pair under the key `lumar/<world>/<blob>`.
//! Values are enveloped with [`crate::blob::wrap`], so a torn or foreign value
//! is detected on load instead of being decoded as garbage.

use std::path::Path;

use rusty_leveldb::DB;
use tracing::{debug, warn};

use crate::blob::PersistentByteData;
use crate::error::PersistError;

/// Build the LevelDB key for a world blob.
pub fn blob_key(world: &str, blob: &str) -> Vec<u8> {
    format!("lumar/{world}/{blob}").into_bytes()
}

/// Result of loading a blob that may be absent or damaged.
#[derive(Debug)]
pub enum BlobLoad<T> {
    Missing,
    Corrupt(PersistError),
    Loaded(T),
}

pub struct BlobStore {
    db: DB,
}

impl BlobStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, PersistError> {
        std::fs::create_dir_all(path).map_err(|e| {
            PersistError::Storage(format!("Failed to create {}: {e}", path.display()))
        })?;
        let opts = rusty_leveldb::Options {
            create_if_missing: true,
            ..rusty_leveldb::Options::default()
        };

        let db = DB::open(path, opts)
            .map_err(|e| PersistError::Storage(format!("Failed to open LevelDB: {e}")))?;
        Ok(Self { db })
    }

    pub fn get_raw(&mut self, world: &str, blob: &str) -> Option<Vec<u8>> {
        self.db.get(&blob_key(world, blob))
    }

    pub fn put_raw(&mut self, world: &str, blob: &str, value: &[u8]) -> Result<(), PersistError> {
        self.db
            .put(&blob_key(world, blob), value)
            .map_err(|e| PersistError::Storage(format!("put {world}/{blob}: {e}")))
    }

    pub fn delete(&mut self, world: &str, blob: &str) -> Result<(), PersistError> {
        self.db
            .delete(&blob_key(world, blob))
            .map_err(|e| PersistError::Storage(format!("delete {world}/{blob}: {e}")))
    }

    pub fn flush(&mut self) -> Result<(), PersistError> {
        self.db
            .flush()
            .map_err(|e| PersistError::Storage(format!("flush: {e}")))
    }

    /// Encode and store `value` under its blob name.
    pub fn save<T: PersistentByteData>(&mut self, world: &str, value: &T) -> Result<(), PersistError> {
        let bytes = value.to_bytes();
        debug!(world, blob = T::BLOB_NAME, len = bytes.len(), "Saving blob");
        self.put_raw(world, T::BLOB_NAME, &bytes)
    }

    pub fn load<T: PersistentByteData>(&mut self, world: &str) -> BlobLoad<T> {
        match self.get_raw(world, T::BLOB_NAME) {
            None => BlobLoad::Missing,
            Some(bytes) => match T::from_bytes(&bytes) {
                Ok(value) => BlobLoad::Loaded(value),
                Err(e) => BlobLoad::Corrupt(e),
            },
        }
    }

    /// Load a blob, falling back to `fresh()` when it is missing or unreadable.
    pub fn load_or_else<T, F>(&mut self, world: &str, fresh: F) -> T
    where
        T: PersistentByteData,
        F: FnOnce() -> T,
    {
        match self.load(world) {
            BlobLoad::Loaded(value) => value,
            BlobLoad::Missing => fresh(),
            BlobLoad::Corrupt(e) => {
                warn!(world, blob = T::BLOB_NAME, "Discarding unreadable blob: {e}");
                fresh()
            }
        }
    }
}
