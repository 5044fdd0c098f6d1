/// Point-in-time copy of the grouped cache counters and gauges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GroupedMetricsSnapshot {
    pub get_hits: u64,
    pub get_misses: u64,

    pub put_calls: u64,
    pub put_new: u64,
    pub put_updates: u64,

    pub evict_calls: u64,
    pub evicted_entries: u64,
    pub stale_skips: u64, // order-log slots popped whose entry was already removed
    pub compactions: u64,
    pub compacted_slots: u64,

    pub remove_calls: u64,
    pub removed_entries: u64,
    pub loads: u64,

    // gauges captured at snapshot time
    pub len: usize,
    pub groups: usize,
    pub order_len: usize,
    pub capacity: usize,
}

impl GroupedMetricsSnapshot {
    /// Fraction of lookups that found an entry, `0.0` when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.get_hits + self.get_misses;
        if total == 0 {
            0.0
        } else {
            self.get_hits as f64 / total as f64
        }
    }
}
