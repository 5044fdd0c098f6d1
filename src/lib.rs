//! cappedcache: a capacity-bounded, two-level `(group, id)` cache with FIFO
//! eviction, a lazily compacted insertion-order log and snapshot/restore.
//!
//! The main entry point is
//! [`CappedGroupedCache`](policy::grouped_fifo::CappedGroupedCache), a
//! thread-safe handle around a single reader/writer lock. Persistence to a
//! JSON file lives behind the `persist` feature, counters behind `metrics`.

pub mod ds;
pub mod error;
pub mod policy;

#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "persist")]
pub mod persist;

pub mod prelude;
pub mod traits;
