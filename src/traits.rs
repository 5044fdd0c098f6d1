//! # Grouped Cache Traits
//!
//! The interface collaborators program against when they need a bounded
//! two-level `(group, id)` cache but not a particular implementation.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────┐
//!   │                 GroupedCache<G, I, T>                     │
//!   │                                                           │
//!   │  get(&, &G, &I) → Option<T>                               │
//!   │  put(&, G, I, T) → Option<T>                              │
//!   │  remove(&, &G, &I) → Option<T>                            │
//!   │  group_remove(&, &G) → usize                              │
//!   │  remove_if(&, FnMut(&G, &T) → bool) → usize               │
//!   │  group_remove_if(&, &G, FnMut(&G, &T) → bool) → usize     │
//!   │  len(&) / is_empty(&) / group_len(&, &G)                  │
//!   │  all(&, FnMut(&G, &T) → ControlFlow<B>)                   │
//!   │  group_all(&, &G, FnMut(&T) → ControlFlow<B>)             │
//!   └───────────────────────────────────────────────────────────┘
//!
//!   ┌───────────────────────────────────────────────────────────┐
//!   │ ConcurrentCache                                           │
//!   │                                                           │
//!   │   Marker trait: Send + Sync                               │
//!   │   Usage: fn f<C: GroupedCache<G, I, T> + ConcurrentCache> │
//!   └───────────────────────────────────────────────────────────┘
//! ```
//!
//! All methods take `&self`: implementations synchronize internally. Absence
//! is reported as `None` or `0`, never as an error.
//!
//! ## Example
//!
//! ```
//! use cappedcache::policy::grouped_fifo::CappedGroupedCache;
//! use cappedcache::traits::{ConcurrentCache, GroupedCache};
//!
//! fn forget_channel<C>(cache: &C, channel: u64) -> usize
//! where
//!     C: GroupedCache<u64, u64, String> + ConcurrentCache,
//! {
//!     cache.group_remove(&channel)
//! }
//!
//! let cache = CappedGroupedCache::new(16);
//! cache.put(1, 1, "hi".to_string());
//! cache.put(1, 2, "there".to_string());
//! assert_eq!(forget_channel(&cache, 1), 2);
//! assert!(GroupedCache::is_empty(&cache));
//! ```

use std::ops::ControlFlow;

/// Bounded cache addressed by a `(group, id)` key pair.
///
/// # Type Parameters
///
/// - `G`: Group key
/// - `I`: Entry key within a group
/// - `T`: Cached entity, returned by clone
pub trait GroupedCache<G, I, T> {
    /// Returns a copy of the entity at `(group, id)`.
    ///
    /// Must not affect eviction order.
    fn get(&self, group: &G, id: &I) -> Option<T>;

    /// Inserts or overwrites an entity, returning the previous one.
    fn put(&self, group: G, id: I, entity: T) -> Option<T>;

    fn remove(&self, group: &G, id: &I) -> Option<T>;

    /// Removes every entry of `group`, returning how many there were.
    fn group_remove(&self, group: &G) -> usize;

    /// Removes every entry matching `predicate`, returning how many matched.
    fn remove_if<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&G, &T) -> bool;

    fn group_remove_if<F>(&self, group: &G, predicate: F) -> usize
    where
        F: FnMut(&G, &T) -> bool;

    /// Number of live entries across all groups.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn group_len(&self, group: &G) -> usize;

    /// Visits every `(group, entity)` until `f` returns `Break`.
    fn all<B, F>(&self, f: F) -> ControlFlow<B>
    where
        F: FnMut(&G, &T) -> ControlFlow<B>;

    /// Visits the entities of `group` until `f` returns `Break`.
    fn group_all<B, F>(&self, group: &G, f: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>;
}

/// Marker trait for caches that are safe to use concurrently.
///
/// Implementors guarantee thread-safe operations. This trait extends
/// `Send + Sync` and can be used as a bound to require concurrent access.
pub trait ConcurrentCache: Send + Sync {}
