//! Picker index (`index.json`): the list of published manifest filenames.
//!
//! Read-modify-write happens under an exclusive lock on `index.json.lock` so
//! concurrent publishers cannot drop each other's entries.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Filename of the index inside a picker directory
pub const INDEX_FILENAME: &str = "index.json";

const LOCK_SUFFIX: &str = ".lock";

/// Errors from updating the index
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Failed to lock index {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write index {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize index: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Index document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackIndex {
    /// Manifest filenames, first-insertion order, no duplicates
    #[serde(default)]
    pub packs: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homeserver_url: Option<String>,

    /// Keys written by other tools
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PackIndex {
    /// Load from disk; absent or unparseable files are treated as empty
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable index, starting empty");
                return Self::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Corrupt index, starting empty");
            Self::default()
        })
    }

    /// Write as two-space pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| IndexError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packs.iter().any(|p| p == name)
    }

    /// Add `name` if missing; returns whether anything changed
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.packs.push(name);
        true
    }

    /// Record the homeserver unless one is already stored
    pub fn set_homeserver_if_missing(&mut self, homeserver_url: Option<&str>) {
        if self.homeserver_url.is_none() {
            self.homeserver_url = homeserver_url.map(str::to_string);
        }
    }
}

/// Exclusive lock held for the duration of a read-modify-write
struct IndexLock {
    file: File,
}

impl IndexLock {
    fn acquire(index_path: &Path) -> Result<Self, IndexError> {
        let mut lock_path = index_path.as_os_str().to_owned();
        lock_path.push(LOCK_SUFFIX);
        let lock_path = PathBuf::from(lock_path);

        let lock_err = |source| IndexError::Lock {
            path: lock_path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(lock_err)?;
        file.lock_exclusive().map_err(lock_err)?;

        Ok(Self { file })
    }
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Add manifest names to the index in `dir`, writing at most once.
///
/// Returns `true` if the index file was rewritten.
pub fn add_all_to_index<I, S>(
    dir: &Path,
    names: I,
    homeserver_url: Option<&str>,
) -> Result<bool, IndexError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let path = dir.join(INDEX_FILENAME);
    let _lock = IndexLock::acquire(&path)?;

    let mut index = PackIndex::load(&path);
    let mut added = Vec::new();
    for name in names {
        let name = name.into();
        if index.insert(name.clone()) {
            added.push(name);
        }
    }

    if added.is_empty() {
        debug!(path = %path.display(), "Index already up to date");
        return Ok(false);
    }

    index.set_homeserver_if_missing(homeserver_url);
    index.save(&path)?;
    info!(path = %path.display(), added = ?added, "Updated index");
    Ok(true)
}

/// Add a single manifest name to the index in `dir`
pub fn add_to_index(dir: &Path, name: &str, homeserver_url: Option<&str>) -> Result<bool, IndexError> {
    add_all_to_index(dir, [name], homeserver_url)
}
