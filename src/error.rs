//! Error types for the cappedcache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when construction parameters are invalid
//!   (e.g. zero capacity passed to a fallible constructor).
//! - [`InvariantError`]: Returned by `check_invariants` when the store, the
//!   order log and the size counter disagree.
//! - [`PersistError`]: Returned by the JSON snapshot adapter (feature
//!   `persist`) when the snapshot file cannot be read, written or decoded.
//!
//! Absence of an entry is never an error: lookups and removals report it as
//! `None` or `0`.
//!
//! ## Example Usage
//!
//! ```
//! use cappedcache::error::ConfigError;
//! use cappedcache::policy::grouped_fifo::CappedGroupedCache;
//!
//! let cache: Result<CappedGroupedCache<u64, u64, String>, ConfigError> =
//!     CappedGroupedCache::try_new(100);
//! assert!(cache.is_ok());
//!
//! let bad = CappedGroupedCache::<u64, u64, String>::try_new(0);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`GroupedFifoCore::check_invariants`](crate::policy::grouped_fifo::GroupedFifoCore::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CappedGroupedCache::try_new`](crate::policy::grouped_fifo::CappedGroupedCache::try_new)
/// and [`CappedGroupedCacheBuilder::try_build`](crate::policy::grouped_fifo::CappedGroupedCacheBuilder::try_build).
///
/// # Example
///
/// ```
/// use cappedcache::policy::grouped_fifo::GroupedFifoCore;
///
/// let err = GroupedFifoCore::<u64, u64, u64>::try_new(0).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// PersistError
// ---------------------------------------------------------------------------

/// Error returned by [`JsonSnapshotStore`](crate::persist::JsonSnapshotStore).
///
/// A missing snapshot file is not an error; it loads as an empty snapshot.
#[cfg(feature = "persist")]
#[derive(Debug)]
pub enum PersistError {
    /// Reading, writing, renaming or creating the snapshot path failed.
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    /// The live entities could not be serialized.
    Encode(serde_json::Error),
    /// The snapshot file exists but is not a JSON array of entities.
    Decode {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(feature = "persist")]
impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "snapshot I/O error at {}: {source}", path.display())
            },
            Self::Encode(e) => write!(f, "failed to encode snapshot: {e}"),
            Self::Decode { path, source } => {
                write!(f, "failed to decode snapshot {}: {source}", path.display())
            },
        }
    }
}

#[cfg(feature = "persist")]
impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Encode(e) => Some(e),
            Self::Decode { source, .. } => Some(source),
        }
    }
}

#[cfg(feature = "persist")]
impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
