use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Could not persist {key}: {source}")]
    Persist {
        key: String,
        #[source]
        source: tempfile::PersistError,
    },
}

/// Named string entries that survive a restart.
///
/// Entries are always read and written whole.
pub trait DurableStorage {
    /// `None` when the entry is missing or unreadable.
    fn read(&self, key: &str) -> Option<String>;

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per entry inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DurableStorage for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);
        match std::fs::read_to_string(&path) {
            Ok(s) => Some(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read storage entry");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        // Temp file in the same directory so the rename cannot cross filesystems.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.entry_path(key))
            .map_err(|source| StorageError::Persist {
                key: key.to_string(),
                source,
            })?;
        Ok(())
    }
}

/// In-process storage. Clones share the same entries, which lets a test
/// "restart" by building a second store over the same handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
