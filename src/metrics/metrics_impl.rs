use std::sync::atomic::{AtomicU64, Ordering};

use crate::metrics::traits::{GroupedMetricsReadRecorder, GroupedMetricsRecorder};

/// Write-path counters, owned by the core and mutated under the write lock.
#[derive(Debug, Default, Clone)]
pub struct GroupedMetrics {
    pub put_calls: u64,
    pub put_new: u64,
    pub put_updates: u64,
    pub evict_calls: u64,
    pub evicted_entries: u64,
    pub stale_skips: u64,
    pub compactions: u64,
    pub compacted_slots: u64,
    pub remove_calls: u64,
    pub removed_entries: u64,
    pub loads: u64,
}

impl GroupedMetricsRecorder for GroupedMetrics {
    fn record_put_call(&mut self) {
        self.put_calls += 1;
    }

    fn record_put_new(&mut self) {
        self.put_new += 1;
    }

    fn record_put_update(&mut self) {
        self.put_updates += 1;
    }

    fn record_evict_call(&mut self) {
        self.evict_calls += 1;
    }

    fn record_evicted_entry(&mut self) {
        self.evicted_entries += 1;
    }

    fn record_stale_skip(&mut self) {
        self.stale_skips += 1;
    }

    fn record_compaction(&mut self, reclaimed: usize) {
        self.compactions += 1;
        self.compacted_slots += reclaimed as u64;
    }

    fn record_remove_call(&mut self) {
        self.remove_calls += 1;
    }

    fn record_removed_entries(&mut self, count: usize) {
        self.removed_entries += count as u64;
    }

    fn record_load(&mut self) {
        self.loads += 1;
    }
}

/// Read-path counters, bumped while only the shared lock is held.
#[derive(Debug, Default)]
pub struct ReadMetrics {
    pub get_hits: AtomicU64,
    pub get_misses: AtomicU64,
}

impl ReadMetrics {
    pub fn hits(&self) -> u64 {
        self.get_hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.get_misses.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.get_hits.store(0, Ordering::Relaxed);
        self.get_misses.store(0, Ordering::Relaxed);
    }
}

impl GroupedMetricsReadRecorder for ReadMetrics {
    fn record_get_hit(&self) {
        self.get_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_get_miss(&self) {
        self.get_misses.fetch_add(1, Ordering::Relaxed);
    }
}
