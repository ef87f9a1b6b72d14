// JSON-file backed store.
//
// The whole map is rewritten on every mutation; UI preference files are
// tiny and writes are rare (one per user action).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use super::{KeyValueStore, PersistError};

/// Store persisting every key into one JSON object on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// logged and treated as empty; it is overwritten by the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring corrupt preference file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read preference file");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), keys = values.len(), "preference store opened");
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, PersistError> {
        self.values
            .lock()
            .map_err(|_| PersistError::Unavailable("preference lock poisoned".into()))
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let mut values = self.lock()?;
        values.insert(key.to_owned(), value.to_owned());
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        let mut values = self.lock()?;
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}
