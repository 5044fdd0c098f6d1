//! Capacity-bounded grouped cache with FIFO (insertion order) eviction.
//!
//! Entries are addressed by a two-level key `(group, id)`, e.g. a channel id
//! and a message id. The cache keeps at most `capacity` live entries; when a
//! new key pushes it over the limit, the oldest *inserted* entries are evicted
//! first. Reads never refresh an entry's position, so this is FIFO, not LRU.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                     GroupedFifoCore<G, I, T> Layout                         │
//! │                                                                             │
//! │   groups: FxHashMap<G, FxHashMap<I, T>>      order: OrderLog<(G, I)>        │
//! │                                                                             │
//! │   ┌───────────┬──────────────────────┐       ┌──────┬──────┬──────┬──────┐  │
//! │   │  group    │  entries             │       │ None │ (a,2)│ (b,9)│ (a,4)│  │
//! │   ├───────────┼──────────────────────┤       └──────┴──────┴──────┴──────┘  │
//! │   │  "a"      │  {2: m2, 4: m4}      │              ▲                       │
//! │   │  "b"      │  {9: m9}             │              head                    │
//! │   └───────────┴──────────────────────┘                                      │
//! │                                                                             │
//! │   len = 3 (live entries)       capacity = fixed at construction             │
//! │                                                                             │
//! │   A group key exists only while it holds at least one entry.                │
//! └─────────────────────────────────────────────────────────────────────────────┘
//!
//! Put Flow (new key)
//! ──────────────────
//!   put(g, id, v):
//!     1. groups[g][id] = v
//!     2. order.push((g, id)); len += 1
//!     3. evict()
//!
//! Put Flow (existing key)
//! ───────────────────────
//!   put(g, id, v):
//!     1. replace groups[g][id] in place, return the old value
//!     (order position and len unchanged, no eviction)
//!
//! Eviction
//! ────────
//!   while len > capacity:
//!     (g, id) = order.pop_front()          (slot cleared, head advanced)
//!     if groups[g][id] exists:
//!       delete it, len -= 1, drop group if empty
//!     else:
//!       stale slot (removed earlier), skip without touching len
//!   order.maybe_compact()
//! ```
//!
//! `remove`, `group_remove`, `remove_if` and `group_remove_if` only touch the
//! store. The order-log slots they leave behind go stale and are skipped by
//! eviction, which keeps every removal O(1) in the size of the log.
//! When a removal empties the store the log is dropped, and when more than
//! twice `capacity` slots are pending they are swept down to the first slot
//! of each live key.
//!
//! ## Operations
//!
//! | Operation         | Lock   | Complexity                  |
//! |-------------------|--------|-----------------------------|
//! | `get`, `contains` | read   | O(1)                        |
//! | `put`             | write  | Amortized O(1)              |
//! | `remove`          | write  | O(1)                        |
//! | `group_remove`    | write  | O(group size) to drop       |
//! | `remove_if`       | write  | O(len)                      |
//! | `len`, `group_len`| read   | O(1)                        |
//! | `all`, `read`     | read   | Lazy, stops on `Break`      |
//! | `snapshot`        | read   | O(len)                      |
//! | `load`            | write  | O(input)                    |
//!
//! ## Thread Safety
//!
//! - [`GroupedFifoCore`]: Single-threaded; requires `&mut self` for mutations.
//! - [`CappedGroupedCache`]: Thread-safe wrapper around one
//!   `parking_lot::RwLock`. Lookups, counts, iteration and `snapshot` share the
//!   read lock; every mutation takes the write lock. Predicates and iteration
//!   callbacks run while the lock is held and must not call back into the same
//!   cache.
//!
//! ## Example Usage
//!
//! ```
//! use cappedcache::policy::grouped_fifo::CappedGroupedCache;
//!
//! let cache: CappedGroupedCache<u64, u64, String> = CappedGroupedCache::new(2);
//!
//! cache.put(1, 10, "first".to_string());
//! cache.put(1, 11, "second".to_string());
//! cache.put(2, 20, "third".to_string());
//!
//! // Oldest insertion went first.
//! assert_eq!(cache.get(&1, &10), None);
//! assert_eq!(cache.get(&1, &11).as_deref(), Some("second"));
//! assert_eq!(cache.len(), 2);
//! ```

use std::collections::hash_map;
use std::fmt::{self, Debug, Formatter};
use std::hash::Hash;
use std::ops::{ControlFlow, Deref};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::ds::OrderLog;
use crate::error::{ConfigError, InvariantError};
use crate::traits::{ConcurrentCache, GroupedCache};

#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::{GroupedMetrics, ReadMetrics};
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::GroupedMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    GroupedMetricsReadRecorder, GroupedMetricsRecorder, MetricsReset, MetricsSnapshotProvider,
};

type Entries<I, T> = FxHashMap<I, T>;

// ---------------------------------------------------------------------------
// Single-threaded core
// ---------------------------------------------------------------------------

/// Single-threaded grouped FIFO store.
///
/// Owns the two-level map, the insertion order log and the live-entry count.
/// [`CappedGroupedCache`] wraps it in a lock; use the core directly when the
/// caller already provides exclusion.
///
/// # Type Parameters
///
/// - `G`: Group key (e.g. channel id)
/// - `I`: Entry key within a group (e.g. message id)
/// - `T`: Stored entity, never inspected
///
/// # Example
///
/// ```
/// use cappedcache::policy::grouped_fifo::GroupedFifoCore;
///
/// let mut core: GroupedFifoCore<&str, u32, &str> = GroupedFifoCore::new(10);
/// core.put("general", 1, "hello");
/// core.put("general", 2, "world");
///
/// assert_eq!(core.get(&"general", &1), Some(&"hello"));
/// assert_eq!(core.group_len(&"general"), 2);
///
/// assert_eq!(core.remove(&"general", &1), Some("hello"));
/// assert_eq!(core.len(), 1);
/// ```
pub struct GroupedFifoCore<G, I, T> {
    groups: FxHashMap<G, Entries<I, T>>,
    order: OrderLog<(G, I)>,
    len: usize,
    capacity: usize,
    #[cfg(feature = "metrics")]
    metrics: GroupedMetrics,
}

impl<G, I, T> GroupedFifoCore<G, I, T>
where
    G: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
{
    /// Creates an empty core holding at most `capacity` entries.
    ///
    /// A capacity of `0` is honored: every insert is evicted immediately.
    pub fn new(capacity: usize) -> Self {
        Self::with_group_capacity(capacity, 0)
    }

    /// Creates an empty core, rejecting a zero capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `capacity == 0`.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        validate_capacity(capacity)?;
        Ok(Self::new(capacity))
    }

    /// Creates an empty core with the group map pre-sized for `groups` keys.
    pub fn with_group_capacity(capacity: usize, groups: usize) -> Self {
        Self {
            groups: FxHashMap::with_capacity_and_hasher(groups, Default::default()),
            order: OrderLog::new(),
            len: 0,
            capacity,
            #[cfg(feature = "metrics")]
            metrics: GroupedMetrics::default(),
        }
    }

    /// Maximum number of live entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live entries across all groups.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live entries in `group` (0 if the group is absent).
    #[inline]
    pub fn group_len(&self, group: &G) -> usize {
        self.groups.get(group).map_or(0, |entries| entries.len())
    }

    /// Number of non-empty groups.
    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of order-log slots, including the dead prefix before the head.
    #[inline]
    pub fn order_len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn contains(&self, group: &G, id: &I) -> bool {
        self.groups
            .get(group)
            .is_some_and(|entries| entries.contains_key(id))
    }

    /// Returns the entity stored at `(group, id)`.
    ///
    /// Does not affect eviction order.
    #[inline]
    pub fn get(&self, group: &G, id: &I) -> Option<&T> {
        self.groups.get(group)?.get(id)
    }

    /// Inserts or overwrites the entity at `(group, id)`.
    ///
    /// A new key is appended to the insertion order and may evict the oldest
    /// entries. Overwriting an existing key keeps its original position,
    /// returns the previous value and never evicts.
    pub fn put(&mut self, group: G, id: I, entity: T) -> Option<T> {
        #[cfg(feature = "metrics")]
        self.metrics.record_put_call();

        if let Some(slot) = self
            .groups
            .get_mut(&group)
            .and_then(|entries| entries.get_mut(&id))
        {
            #[cfg(feature = "metrics")]
            self.metrics.record_put_update();
            return Some(std::mem::replace(slot, entity));
        }

        self.groups
            .entry(group.clone())
            .or_default()
            .insert(id.clone(), entity);
        self.order.push((group, id));
        self.len += 1;
        #[cfg(feature = "metrics")]
        self.metrics.record_put_new();

        self.evict();
        None
    }

    /// Removes and returns the entity at `(group, id)`.
    ///
    /// Its order-log slot is left in place and skipped later.
    pub fn remove(&mut self, group: &G, id: &I) -> Option<T> {
        #[cfg(feature = "metrics")]
        self.metrics.record_remove_call();

        let removed = self.detach(group, id);
        if removed.is_some() {
            #[cfg(feature = "metrics")]
            self.metrics.record_removed_entries(1);
            self.reclaim_stale_slots();
        }
        removed
    }

    /// Removes every entry in `group`, returning how many were dropped.
    pub fn group_remove(&mut self, group: &G) -> usize {
        #[cfg(feature = "metrics")]
        self.metrics.record_remove_call();

        let Some(entries) = self.groups.remove(group) else {
            return 0;
        };
        let removed = entries.len();
        self.len -= removed;
        #[cfg(feature = "metrics")]
        self.metrics.record_removed_entries(removed);
        self.reclaim_stale_slots();
        debug!(removed, remaining = self.len, "removed cache group");
        removed
    }

    /// Removes every entry, in any group, for which `predicate` returns `true`.
    ///
    /// Groups left empty are dropped. Returns the number of removed entries.
    pub fn remove_if<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&G, &T) -> bool,
    {
        #[cfg(feature = "metrics")]
        self.metrics.record_remove_call();

        let mut removed = 0;
        self.groups.retain(|group, entries| {
            entries.retain(|_, entity| {
                let hit = predicate(group, entity);
                removed += usize::from(hit);
                !hit
            });
            !entries.is_empty()
        });
        self.len -= removed;
        #[cfg(feature = "metrics")]
        self.metrics.record_removed_entries(removed);
        if removed > 0 {
            self.reclaim_stale_slots();
        }
        removed
    }

    /// Same as [`remove_if`](Self::remove_if), restricted to one group.
    pub fn group_remove_if<F>(&mut self, group: &G, mut predicate: F) -> usize
    where
        F: FnMut(&G, &T) -> bool,
    {
        #[cfg(feature = "metrics")]
        self.metrics.record_remove_call();

        let Some(entries) = self.groups.get_mut(group) else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entity| !predicate(group, entity));
        let removed = before - entries.len();
        if entries.is_empty() {
            self.groups.remove(group);
        }
        self.len -= removed;
        #[cfg(feature = "metrics")]
        self.metrics.record_removed_entries(removed);
        if removed > 0 {
            self.reclaim_stale_slots();
        }
        removed
    }

    /// Lazily iterates `(group, entity)` pairs in unspecified order.
    pub fn iter(&self) -> Iter<'_, G, I, T> {
        Iter {
            groups: self.groups.iter(),
            current: None,
        }
    }

    /// Lazily iterates the entities of one group in unspecified order.
    pub fn group_iter(&self, group: &G) -> GroupIter<'_, I, T> {
        GroupIter {
            inner: self.groups.get(group).map(|entries| entries.values()),
        }
    }

    /// Iterates the keys of all non-empty groups.
    pub fn groups(&self) -> impl Iterator<Item = &G> + '_ {
        self.groups.keys()
    }

    /// Visits every `(group, entity)` until `f` breaks.
    pub fn all<B, F>(&self, mut f: F) -> ControlFlow<B>
    where
        F: FnMut(&G, &T) -> ControlFlow<B>,
    {
        self.iter().try_for_each(|(group, entity)| f(group, entity))
    }

    /// Visits every entity of `group` until `f` breaks.
    pub fn group_all<B, F>(&self, group: &G, f: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        self.group_iter(group).try_for_each(f)
    }

    /// Clones every live entity, in unspecified order, for persistence.
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut items = Vec::with_capacity(self.len);
        items.extend(self.iter().map(|(_, entity)| entity.clone()));
        items
    }

    /// Replaces all state with `entities`, keyed by `key_fn`.
    ///
    /// Entities are appended to the insertion order in input order. A key that
    /// appears twice keeps the later entity at the earlier position. If the
    /// input holds more than `capacity` distinct keys, the oldest are evicted.
    /// Returns the resulting number of live entries.
    pub fn load<E, F>(&mut self, entities: E, mut key_fn: F) -> usize
    where
        E: IntoIterator<Item = T>,
        F: FnMut(&T) -> (G, I),
    {
        self.groups.clear();
        self.order.clear();
        self.len = 0;

        let entities = entities.into_iter();
        self.order.reserve(entities.size_hint().0);

        let mut duplicates = 0usize;
        for entity in entities {
            let (group, id) = key_fn(&entity);
            let entries = self.groups.entry(group.clone()).or_default();
            match entries.entry(id.clone()) {
                hash_map::Entry::Occupied(mut slot) => {
                    slot.insert(entity);
                    duplicates += 1;
                },
                hash_map::Entry::Vacant(slot) => {
                    slot.insert(entity);
                    self.order.push((group, id));
                    self.len += 1;
                },
            }
        }

        let evicted = if self.len > self.capacity {
            self.evict()
        } else {
            0
        };
        #[cfg(feature = "metrics")]
        self.metrics.record_load();
        debug!(loaded = self.len, duplicates, evicted, "loaded grouped cache");
        self.len
    }

    /// Drops every entry and the whole order log.
    pub fn clear(&mut self) {
        let dropped = self.len;
        self.groups.clear();
        self.order.clear();
        self.len = 0;
        debug!(dropped, "cleared grouped cache");
    }

    /// Checks that the store, the order log and the size counter agree.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError`] describing the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let counted: usize = self.groups.values().map(|entries| entries.len()).sum();
        if counted != self.len {
            return Err(InvariantError::new(format!(
                "len {} != sum of group sizes {}",
                self.len, counted
            )));
        }
        if self.groups.values().any(|entries| entries.is_empty()) {
            return Err(InvariantError::new("empty group left in store"));
        }
        if self.len > self.capacity {
            return Err(InvariantError::new(format!(
                "len {} exceeds capacity {}",
                self.len, self.capacity
            )));
        }
        self.order.check_invariants()?;

        let pending: FxHashSet<&(G, I)> = self.order.iter_pending().collect();
        for (group, entries) in &self.groups {
            for id in entries.keys() {
                if !pending.contains(&(group.clone(), id.clone())) {
                    return Err(InvariantError::new(
                        "live entry has no order-log slot after head",
                    ));
                }
            }
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    /// Panics if [`check_invariants`](Self::check_invariants) fails.
    pub fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("grouped cache invariant violated: {err}");
        }
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn metrics(&self) -> &GroupedMetrics {
        &self.metrics
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn reset_metrics(&mut self) {
        self.metrics = GroupedMetrics::default();
    }

    /// Pops order-log slots until `len <= capacity`, skipping stale ones.
    ///
    /// Returns the number of evicted live entries.
    fn evict(&mut self) -> usize {
        #[cfg(feature = "metrics")]
        self.metrics.record_evict_call();

        let mut evicted = 0;
        while self.len > self.capacity {
            let Some((group, id)) = self.order.pop_front() else {
                break;
            };
            if self.detach(&group, &id).is_some() {
                evicted += 1;
                #[cfg(feature = "metrics")]
                self.metrics.record_evicted_entry();
            } else {
                #[cfg(feature = "metrics")]
                self.metrics.record_stale_skip();
            }
        }

        let reclaimed = self.order.maybe_compact();
        if reclaimed > 0 {
            #[cfg(feature = "metrics")]
            self.metrics.record_compaction(reclaimed);
            trace!(reclaimed, remaining = self.order.len(), "compacted order log");
        }
        evicted
    }

    /// Bounds the order log after a removal.
    ///
    /// An empty store makes every slot stale, so the log is dropped. Otherwise,
    /// once more than twice `capacity` slots are pending, the pending region
    /// is rebuilt keeping only the first slot of each live key, which is the
    /// slot eviction would reach first.
    fn reclaim_stale_slots(&mut self) {
        let reclaimed = if self.len == 0 {
            let dropped = self.order.len();
            self.order.clear();
            dropped
        } else if self.order.pending() > 2 * self.capacity.max(1) {
            let groups = &self.groups;
            let mut seen: FxHashSet<(G, I)> =
                FxHashSet::with_capacity_and_hasher(self.len, Default::default());
            self.order.retain_pending(|(group, id)| {
                groups
                    .get(group)
                    .is_some_and(|entries| entries.contains_key(id))
                    && seen.insert((group.clone(), id.clone()))
            })
        } else {
            0
        };

        if reclaimed > 0 {
            #[cfg(feature = "metrics")]
            self.metrics.record_compaction(reclaimed);
            trace!(reclaimed, remaining = self.order.len(), "swept stale order-log slots");
        }
    }

    /// Deletes `(group, id)` from the store only, dropping an emptied group.
    fn detach(&mut self, group: &G, id: &I) -> Option<T> {
        let entries = self.groups.get_mut(group)?;
        let entity = entries.remove(id)?;
        if entries.is_empty() {
            self.groups.remove(group);
        }
        self.len -= 1;
        Some(entity)
    }
}

impl<G, I, T> Debug for GroupedFifoCore<G, I, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupedFifoCore")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("groups", &self.groups.len())
            .field("order_len", &self.order.len())
            .field("order_head", &self.order.head())
            .finish()
    }
}

fn validate_capacity(capacity: usize) -> Result<(), ConfigError> {
    if capacity == 0 {
        return Err(ConfigError::new("capacity must be > 0"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Borrowed iterators
// ---------------------------------------------------------------------------

/// Iterator over `(group, entity)` pairs, returned by [`GroupedFifoCore::iter`].
pub struct Iter<'a, G, I, T> {
    groups: hash_map::Iter<'a, G, Entries<I, T>>,
    current: Option<(&'a G, hash_map::Values<'a, I, T>)>,
}

impl<'a, G, I, T> Iterator for Iter<'a, G, I, T> {
    type Item = (&'a G, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((group, values)) = &mut self.current {
                if let Some(entity) = values.next() {
                    return Some((*group, entity));
                }
            }
            let (group, entries) = self.groups.next()?;
            self.current = Some((group, entries.values()));
        }
    }
}

/// Iterator over one group's entities, returned by [`GroupedFifoCore::group_iter`].
pub struct GroupIter<'a, I, T> {
    inner: Option<hash_map::Values<'a, I, T>>,
}

impl<'a, I, T> Iterator for GroupIter<'a, I, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner
            .as_ref()
            .map_or((0, Some(0)), |values| values.size_hint())
    }
}

// ---------------------------------------------------------------------------
// Concurrent wrapper
// ---------------------------------------------------------------------------

/// Builder for configuring a [`CappedGroupedCache`].
#[derive(Debug, Clone)]
pub struct CappedGroupedCacheBuilder {
    capacity: usize,
    group_capacity: usize,
}

impl CappedGroupedCacheBuilder {
    /// Creates a builder for a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            group_capacity: 0,
        }
    }

    /// Pre-sizes the group map for `groups` distinct group keys.
    pub fn group_capacity(mut self, groups: usize) -> Self {
        self.group_capacity = groups;
        self
    }

    /// Builds the cache. A capacity of `0` is honored (every insert is evicted).
    pub fn build<G, I, T>(self) -> CappedGroupedCache<G, I, T>
    where
        G: Eq + Hash + Clone,
        I: Eq + Hash + Clone,
    {
        CappedGroupedCache::from_core(GroupedFifoCore::with_group_capacity(
            self.capacity,
            self.group_capacity,
        ))
    }

    /// Builds the cache, rejecting a zero capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configured capacity is `0`.
    ///
    /// # Example
    ///
    /// ```
    /// use cappedcache::policy::grouped_fifo::CappedGroupedCache;
    ///
    /// let cache = CappedGroupedCache::<u64, u64, String>::builder(10_000)
    ///     .group_capacity(64)
    ///     .try_build::<u64, u64, String>();
    /// assert!(cache.is_ok());
    /// ```
    pub fn try_build<G, I, T>(self) -> Result<CappedGroupedCache<G, I, T>, ConfigError>
    where
        G: Eq + Hash + Clone,
        I: Eq + Hash + Clone,
    {
        validate_capacity(self.capacity)?;
        Ok(self.build())
    }
}

/// Thread-safe grouped FIFO cache.
///
/// Wraps a [`GroupedFifoCore`] in a single `parking_lot::RwLock`. Every
/// operation is linearizable with respect to that lock. Cloning the handle
/// shares the same cache.
///
/// # Example
///
/// ```
/// use std::ops::ControlFlow;
///
/// use cappedcache::policy::grouped_fifo::CappedGroupedCache;
///
/// let members: CappedGroupedCache<u64, u64, String> = CappedGroupedCache::new(1_000);
/// members.put(7, 100, "alice".to_string());
/// members.put(7, 101, "bob".to_string());
/// members.put(8, 100, "alice".to_string());
///
/// assert_eq!(members.group_len(&7), 2);
///
/// // Stop after the first entity; the read lock is released on return.
/// let first = members.group_all(&7, |name| ControlFlow::Break(name.clone()));
/// assert!(matches!(first, ControlFlow::Break(_)));
///
/// members.group_remove(&7);
/// assert_eq!(members.len(), 1);
/// ```
pub struct CappedGroupedCache<G, I, T> {
    inner: Arc<RwLock<GroupedFifoCore<G, I, T>>>,
    #[cfg(feature = "metrics")]
    reads: Arc<ReadMetrics>,
}

impl<G, I, T> Clone for CappedGroupedCache<G, I, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            #[cfg(feature = "metrics")]
            reads: Arc::clone(&self.reads),
        }
    }
}

impl<G, I, T> CappedGroupedCache<G, I, T>
where
    G: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of `0` is honored: every insert is evicted immediately.
    pub fn new(capacity: usize) -> Self {
        Self::from_core(GroupedFifoCore::new(capacity))
    }

    /// Creates a cache, rejecting a zero capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `capacity == 0`.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        GroupedFifoCore::try_new(capacity).map(Self::from_core)
    }

    /// Returns a builder for configuring cache parameters.
    pub fn builder(capacity: usize) -> CappedGroupedCacheBuilder {
        CappedGroupedCacheBuilder::new(capacity)
    }

    /// Wraps an existing core.
    pub fn from_core(core: GroupedFifoCore<G, I, T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(core)),
            #[cfg(feature = "metrics")]
            reads: Arc::new(ReadMetrics::default()),
        }
    }

    /// Returns a clone of the entity at `(group, id)`.
    ///
    /// Uses a **read lock**. Does not affect eviction order.
    pub fn get(&self, group: &G, id: &I) -> Option<T>
    where
        T: Clone,
    {
        self.get_with(group, id, T::clone)
    }

    /// Applies `f` to the entity at `(group, id)` under the read lock.
    ///
    /// Works with non-cloneable entities.
    pub fn get_with<F, R>(&self, group: &G, id: &I, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        let guard = self.inner.read();
        let result = guard.get(group, id);

        #[cfg(feature = "metrics")]
        {
            if result.is_some() {
                self.reads.record_get_hit();
            } else {
                self.reads.record_get_miss();
            }
        }

        result.map(f)
    }

    pub fn contains(&self, group: &G, id: &I) -> bool {
        self.inner.read().contains(group, id)
    }

    /// Inserts or overwrites an entity. Uses a **write lock**.
    ///
    /// See [`GroupedFifoCore::put`].
    pub fn put(&self, group: G, id: I, entity: T) -> Option<T> {
        self.inner.write().put(group, id, entity)
    }

    /// Removes and returns the entity at `(group, id)`. Uses a **write lock**.
    pub fn remove(&self, group: &G, id: &I) -> Option<T> {
        self.inner.write().remove(group, id)
    }

    /// Removes a whole group, returning how many entries it held.
    pub fn group_remove(&self, group: &G) -> usize {
        self.inner.write().group_remove(group)
    }

    /// Removes every entry matching `predicate`. Runs under the write lock.
    pub fn remove_if<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&G, &T) -> bool,
    {
        self.inner.write().remove_if(predicate)
    }

    /// Removes the entries of `group` matching `predicate`.
    pub fn group_remove_if<F>(&self, group: &G, predicate: F) -> usize
    where
        F: FnMut(&G, &T) -> bool,
    {
        self.inner.write().group_remove_if(group, predicate)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn group_len(&self, group: &G) -> usize {
        self.inner.read().group_len(group)
    }

    pub fn group_count(&self) -> usize {
        self.inner.read().group_count()
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// Visits every `(group, entity)` under the read lock until `f` breaks.
    ///
    /// The lock is released when this returns, whether or not `f` broke early.
    pub fn all<B, F>(&self, f: F) -> ControlFlow<B>
    where
        F: FnMut(&G, &T) -> ControlFlow<B>,
    {
        self.inner.read().all(f)
    }

    /// Visits the entities of `group` under the read lock until `f` breaks.
    pub fn group_all<B, F>(&self, group: &G, f: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        self.inner.read().group_all(group, f)
    }

    /// Holds the read lock and exposes the core's borrowed iterators.
    ///
    /// Writers block until the guard is dropped, so keep it short-lived.
    ///
    /// # Example
    ///
    /// ```
    /// use cappedcache::policy::grouped_fifo::CappedGroupedCache;
    ///
    /// let cache: CappedGroupedCache<u8, u8, u8> = CappedGroupedCache::new(8);
    /// cache.put(1, 1, 10);
    /// cache.put(1, 2, 20);
    ///
    /// let total: u32 = cache.read().group_iter(&1).map(|v| u32::from(*v)).sum();
    /// assert_eq!(total, 30);
    /// ```
    pub fn read(&self) -> GroupedReadGuard<'_, G, I, T> {
        GroupedReadGuard {
            guard: self.inner.read(),
        }
    }

    /// Clones every live entity for persistence. Uses a **read lock**.
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.inner.read().snapshot()
    }

    /// Atomically replaces all state with `entities`. Uses a **write lock**.
    ///
    /// See [`GroupedFifoCore::load`].
    pub fn load<E, F>(&self, entities: E, key_fn: F) -> usize
    where
        E: IntoIterator<Item = T>,
        F: FnMut(&T) -> (G, I),
    {
        self.inner.write().load(entities, key_fn)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Number of order-log slots, including the dead prefix.
    pub fn order_len(&self) -> usize {
        self.inner.read().order_len()
    }

    /// See [`GroupedFifoCore::check_invariants`].
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.read().check_invariants()
    }
}

impl<G, I, T> Debug for CappedGroupedCache<G, I, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CappedGroupedCache")
            .field("inner", &*self.inner.read())
            .finish()
    }
}

impl<G, I, T> From<GroupedFifoCore<G, I, T>> for CappedGroupedCache<G, I, T>
where
    G: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
{
    fn from(core: GroupedFifoCore<G, I, T>) -> Self {
        Self::from_core(core)
    }
}

impl<G, I, T> ConcurrentCache for CappedGroupedCache<G, I, T>
where
    G: Send + Sync,
    I: Send + Sync,
    T: Send + Sync,
{
}

impl<G, I, T> GroupedCache<G, I, T> for CappedGroupedCache<G, I, T>
where
    G: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
    T: Clone,
{
    fn get(&self, group: &G, id: &I) -> Option<T> {
        CappedGroupedCache::get(self, group, id)
    }

    fn put(&self, group: G, id: I, entity: T) -> Option<T> {
        CappedGroupedCache::put(self, group, id, entity)
    }

    fn remove(&self, group: &G, id: &I) -> Option<T> {
        CappedGroupedCache::remove(self, group, id)
    }

    fn group_remove(&self, group: &G) -> usize {
        CappedGroupedCache::group_remove(self, group)
    }

    fn remove_if<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&G, &T) -> bool,
    {
        CappedGroupedCache::remove_if(self, predicate)
    }

    fn group_remove_if<F>(&self, group: &G, predicate: F) -> usize
    where
        F: FnMut(&G, &T) -> bool,
    {
        CappedGroupedCache::group_remove_if(self, group, predicate)
    }

    fn len(&self) -> usize {
        CappedGroupedCache::len(self)
    }

    fn group_len(&self, group: &G) -> usize {
        CappedGroupedCache::group_len(self, group)
    }

    fn all<B, F>(&self, f: F) -> ControlFlow<B>
    where
        F: FnMut(&G, &T) -> ControlFlow<B>,
    {
        CappedGroupedCache::all(self, f)
    }

    fn group_all<B, F>(&self, group: &G, f: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        CappedGroupedCache::group_all(self, group, f)
    }
}

#[cfg(feature = "metrics")]
impl<G, I, T> MetricsSnapshotProvider<GroupedMetricsSnapshot> for CappedGroupedCache<G, I, T>
where
    G: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
{
    fn metrics_snapshot(&self) -> GroupedMetricsSnapshot {
        let core = self.inner.read();
        let m = core.metrics();
        GroupedMetricsSnapshot {
            get_hits: self.reads.hits(),
            get_misses: self.reads.misses(),
            put_calls: m.put_calls,
            put_new: m.put_new,
            put_updates: m.put_updates,
            evict_calls: m.evict_calls,
            evicted_entries: m.evicted_entries,
            stale_skips: m.stale_skips,
            compactions: m.compactions,
            compacted_slots: m.compacted_slots,
            remove_calls: m.remove_calls,
            removed_entries: m.removed_entries,
            loads: m.loads,
            len: core.len(),
            groups: core.group_count(),
            order_len: core.order_len(),
            capacity: core.capacity(),
        }
    }
}

#[cfg(feature = "metrics")]
impl<G, I, T> MetricsReset for CappedGroupedCache<G, I, T>
where
    G: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
{
    fn reset_metrics(&self) {
        self.inner.write().reset_metrics();
        self.reads.reset();
    }
}

/// Read guard returned by [`CappedGroupedCache::read`].
///
/// Dereferences to the [`GroupedFifoCore`]; dropping it releases the lock.
pub struct GroupedReadGuard<'a, G, I, T> {
    guard: RwLockReadGuard<'a, GroupedFifoCore<G, I, T>>,
}

impl<G, I, T> Deref for GroupedReadGuard<'_, G, I, T> {
    type Target = GroupedFifoCore<G, I, T>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Put(u8, u8, u32),
        Get(u8, u8),
        Remove(u8, u8),
        GroupRemove(u8),
        RemoveIfOdd,
        GroupRemoveIfEven(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0u8..4, 0u8..40, any::<u32>()).prop_map(|(g, i, v)| Op::Put(g, i, v)),
            2 => (0u8..4, 0u8..40).prop_map(|(g, i)| Op::Get(g, i)),
            2 => (0u8..4, 0u8..40).prop_map(|(g, i)| Op::Remove(g, i)),
            1 => (0u8..4).prop_map(Op::GroupRemove),
            1 => Just(Op::RemoveIfOdd),
            1 => (0u8..4).prop_map(Op::GroupRemoveIfEven),
        ]
    }

    proptest! {
        /// len() never exceeds capacity after any put.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_len_within_capacity(
            capacity in 0usize..32,
            puts in prop::collection::vec((0u8..4, 0u8..64, any::<u32>()), 0..300)
        ) {
            let mut core = GroupedFifoCore::new(capacity);
            for (g, i, v) in puts {
                core.put(g, i, v);
                prop_assert!(core.len() <= capacity);
            }
        }

        /// Arbitrary operation sequences keep store, order log and size in sync.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_arbitrary_ops_maintain_invariants(
            capacity in 1usize..24,
            ops in prop::collection::vec(op_strategy(), 0..300)
        ) {
            let mut core = GroupedFifoCore::new(capacity);
            for op in ops {
                match op {
                    Op::Put(g, i, v) => { core.put(g, i, v); },
                    Op::Get(g, i) => { core.get(&g, &i); },
                    Op::Remove(g, i) => { core.remove(&g, &i); },
                    Op::GroupRemove(g) => { core.group_remove(&g); },
                    Op::RemoveIfOdd => { core.remove_if(|_, v| v % 2 == 1); },
                    Op::GroupRemoveIfEven(g) => { core.group_remove_if(&g, |_, v| v % 2 == 0); },
                }
                prop_assert!(core.check_invariants().is_ok(), "{:?}", core.check_invariants());
                let by_group: usize = core.groups().map(|g| core.group_len(g)).sum();
                prop_assert_eq!(by_group, core.len());
            }
        }

        /// With distinct keys and no removals, exactly the newest `capacity` survive.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_fifo_keeps_newest(capacity in 1usize..50, total in 0usize..200) {
            let mut core = GroupedFifoCore::new(capacity);
            for i in 0..total {
                core.put((i % 3) as u8, i as u32, i);
            }
            let kept = total.min(capacity);
            prop_assert_eq!(core.len(), kept);
            for i in 0..total {
                let present = core.contains(&((i % 3) as u8), &(i as u32));
                prop_assert_eq!(present, i >= total - kept);
            }
        }

        /// snapshot() followed by load() reproduces the same addressable set.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_snapshot_load_round_trip(
            capacity in 1usize..40,
            puts in prop::collection::vec((0u8..5, 0u8..60), 0..200),
            removes in prop::collection::vec((0u8..5, 0u8..60), 0..50)
        ) {
            let mut core = GroupedFifoCore::new(capacity);
            for (g, i) in puts {
                core.put(g, i, (g, i));
            }
            for (g, i) in removes {
                core.remove(&g, &i);
            }

            let mut restored = GroupedFifoCore::new(capacity);
            restored.load(core.snapshot(), |&(g, i)| (g, i));

            prop_assert_eq!(restored.len(), core.len());
            for (g, v) in core.iter() {
                prop_assert!(restored.contains(g, &v.1));
            }
            prop_assert!(restored.check_invariants().is_ok());
        }
    }
}
