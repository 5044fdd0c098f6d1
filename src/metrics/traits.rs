//! # Metrics Trait Hierarchy
//!
//! Separates *recording*, *snapshotting* and *export* into small traits so
//! production monitoring and bench/test inspection do not leak into the
//! eviction logic.
//!
//! ```text
//!   ┌─────────────────────────────┐      ┌─────────────────────────────┐
//!   │   GroupedMetricsRecorder    │      │ GroupedMetricsReadRecorder  │
//!   │   (&mut self, write lock)   │      │ (&self, read lock, atomics) │
//!   │   put/evict/remove/load     │      │ get hit / get miss          │
//!   └──────────────┬──────────────┘      └──────────────┬──────────────┘
//!                  │                                    │
//!                  └──────────────┬─────────────────────┘
//!                                 ▼
//!                  ┌──────────────────────────────┐
//!                  │ MetricsSnapshotProvider<S>   │──► MetricsExporter<S>
//!                  └──────────────────────────────┘
//! ```
//!
//! Mutating operations already hold the exclusive lock, so their counters are
//! plain integers. Lookups only hold the shared lock and record through
//! atomics instead.

/// Counters bumped by mutating operations on the grouped cache.
pub trait GroupedMetricsRecorder {
    fn record_put_call(&mut self);
    fn record_put_new(&mut self);
    fn record_put_update(&mut self);
    fn record_evict_call(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_stale_skip(&mut self);
    fn record_compaction(&mut self, reclaimed: usize);
    fn record_remove_call(&mut self);
    fn record_removed_entries(&mut self, count: usize);
    fn record_load(&mut self);
}

/// Counters bumped on the shared-lock read path.
pub trait GroupedMetricsReadRecorder {
    fn record_get_hit(&self);
    fn record_get_miss(&self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn metrics_snapshot(&self) -> S;
}

/// Reset metrics between tests or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&self);
}

/// Export/publish metrics to production monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
