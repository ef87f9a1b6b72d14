// ── Preference persistence ──
//
// Grids persist layout through a small string key-value capability so the
// real store and test fakes are interchangeable.

mod file;
mod memory;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode store contents: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// String key-value store for UI preferences.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;

    fn remove(&self, key: &str) -> Result<(), PersistError>;
}

/// Store whose every operation fails, for exercising the swallow-and-log
/// paths.
#[cfg(test)]
pub(crate) struct BrokenStore;

#[cfg(test)]
impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, PersistError> {
        Err(PersistError::Unavailable("quota exceeded".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), PersistError> {
        Err(PersistError::Unavailable("quota exceeded".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), PersistError> {
        Err(PersistError::Unavailable("quota exceeded".into()))
    }
}
