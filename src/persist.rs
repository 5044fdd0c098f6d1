//! JSON snapshot files for [`CappedGroupedCache`].
//!
//! A snapshot is a bare JSON array of entities. Keys are not stored: the
//! caller supplies a `key_fn` on load that derives `(group, id)` from each
//! entity, the same way it did when the entities were first cached.
//!
//! ```text
//!   save:       cache.read() ──► serde_json ──► <dir>/.<file>.tmp ──rename──► <dir>/<file>
//!   load_into:  <dir>/<file> ──► serde_json ──► cache.load(entities, key_fn)
//! ```
//!
//! A missing file is a normal first start and loads nothing. A file that
//! exists but cannot be read or decoded is an error, and the cache is left
//! exactly as it was.
//!
//! ## Example
//!
//! ```
//! use cappedcache::persist::{JsonSnapshotStore, SnapshotConfig};
//! use cappedcache::policy::grouped_fifo::CappedGroupedCache;
//!
//! # fn main() -> Result<(), cappedcache::error::PersistError> {
//! let dir = tempfile::tempdir().expect("tempdir");
//! let store = JsonSnapshotStore::new(SnapshotConfig::messages(dir.path()));
//!
//! let cache: CappedGroupedCache<u64, u64, (u64, u64, String)> = CappedGroupedCache::new(100);
//! cache.put(1, 10, (1, 10, "hello".to_string()));
//! assert_eq!(store.save(&cache)?, 1);
//!
//! let restored = CappedGroupedCache::new(100);
//! store.load_into(&restored, |m: &(u64, u64, String)| (m.0, m.1))?;
//! assert_eq!(restored.get(&1, &10).map(|m| m.2), Some("hello".to_string()));
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::hash::Hash;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::PersistError;
use crate::policy::grouped_fifo::CappedGroupedCache;

/// File name used for cached chat messages, keyed by `(channel, message)`.
pub const MESSAGE_CACHE_FILE: &str = "messagecache.json";
/// File name used for cached guild members, keyed by `(guild, user)`.
pub const MEMBER_CACHE_FILE: &str = "membercache.json";

/// Where a snapshot file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// Directory, created on save if missing.
    pub dir: PathBuf,
    pub file_name: String,
}

impl SnapshotConfig {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    /// Snapshot of cached messages in `dir`.
    pub fn messages(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, MESSAGE_CACHE_FILE)
    }

    /// Snapshot of cached members in `dir`.
    pub fn members(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, MEMBER_CACHE_FILE)
    }

    /// Full path of the snapshot file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    fn tmp_path(&self) -> PathBuf {
        self.dir.join(format!(".{}.tmp", self.file_name))
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self::new("./cache", "cache.json")
    }
}

/// Saves and restores one cache as a JSON array file.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    config: SnapshotConfig,
}

impl JsonSnapshotStore {
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    pub fn path(&self) -> PathBuf {
        self.config.path()
    }

    /// Writes every live entity of `cache` to the snapshot file.
    ///
    /// Entities are serialized under the cache's read lock; the file is
    /// written after the lock is released. The write goes to a temporary
    /// sibling first and is renamed over the target, so a crash mid-write
    /// never leaves a truncated snapshot. Returns the number of entities.
    ///
    /// # Errors
    ///
    /// [`PersistError::Encode`] if an entity fails to serialize,
    /// [`PersistError::Io`] if the directory or file cannot be written.
    pub fn save<G, I, T>(&self, cache: &CappedGroupedCache<G, I, T>) -> Result<usize, PersistError>
    where
        G: Eq + Hash + Clone,
        I: Eq + Hash + Clone,
        T: Serialize,
    {
        let (count, data) = {
            let guard = cache.read();
            let items: Vec<&T> = guard.iter().map(|(_, entity)| entity).collect();
            (items.len(), serde_json::to_vec(&items)?)
        };

        fs::create_dir_all(&self.config.dir).map_err(|source| PersistError::Io {
            path: self.config.dir.clone(),
            source,
        })?;

        let tmp = self.config.tmp_path();
        fs::write(&tmp, &data).map_err(|source| PersistError::Io {
            path: tmp.clone(),
            source,
        })?;

        let path = self.path();
        fs::rename(&tmp, &path).map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })?;

        info!(count, path = %path.display(), "saved cache snapshot");
        Ok(count)
    }

    /// Replaces the contents of `cache` with the snapshot file.
    ///
    /// Returns the number of live entries after loading (duplicates collapse
    /// and the cache's capacity is enforced). A missing file returns `Ok(0)`
    /// without touching `cache`.
    ///
    /// # Errors
    ///
    /// [`PersistError::Io`] if the file exists but cannot be read,
    /// [`PersistError::Decode`] if it is not a JSON array of `T`. In both
    /// cases `cache` is unchanged.
    pub fn load_into<G, I, T, F>(
        &self,
        cache: &CappedGroupedCache<G, I, T>,
        key_fn: F,
    ) -> Result<usize, PersistError>
    where
        G: Eq + Hash + Clone,
        I: Eq + Hash + Clone,
        T: DeserializeOwned,
        F: FnMut(&T) -> (G, I),
    {
        let path = self.path();
        let Some(items) = read_entities::<T>(&path)? else {
            debug!(path = %path.display(), "no cache snapshot found");
            return Ok(0);
        };

        let count = cache.load(items, key_fn);
        info!(count, path = %path.display(), "loaded cache snapshot");
        Ok(count)
    }

    /// Deletes the snapshot file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// [`PersistError::Io`] if the file exists but cannot be removed.
    pub fn remove(&self) -> Result<(), PersistError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistError::Io { path, source }),
        }
    }
}

fn read_entities<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, PersistError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistError::Io {
                path: path.to_path_buf(),
                source,
            });
        },
    };

    match serde_json::from_slice(&data) {
        Ok(items) => Ok(Some(items)),
        Err(source) => {
            warn!(path = %path.display(), error = %source, "failed to decode cache snapshot");
            Err(PersistError::Decode {
                path: path.to_path_buf(),
                source,
            })
        },
    }
}
