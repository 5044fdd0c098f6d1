// ==============================================
// GROUPED CACHE METRICS TESTS (integration)
// ==============================================
use cappedcache::metrics::exporter::PrometheusTextExporter;
use cappedcache::metrics::snapshot::GroupedMetricsSnapshot;
use cappedcache::metrics::traits::{MetricsExporter, MetricsReset, MetricsSnapshotProvider};
use cappedcache::policy::grouped_fifo::CappedGroupedCache;

fn churned_cache() -> CappedGroupedCache<u64, u64, u64> {
    let cache = CappedGroupedCache::new(3);
    cache.put(1, 1, 1);
    cache.put(1, 2, 2);
    cache.put(1, 3, 3);
    cache.put(1, 1, 10);
    cache.remove(&1, &2);
    cache.put(1, 4, 4);
    // Evicts (1, 1).
    cache.put(1, 5, 5);
    // Skips the stale (1, 2) slot, evicts (1, 3), then compacts.
    cache.put(1, 6, 6);
    cache
}

#[test]
fn write_path_counters() {
    let cache = churned_cache();
    let snap = cache.metrics_snapshot();

    assert_eq!(snap.put_calls, 7);
    assert_eq!(snap.put_new, 6);
    assert_eq!(snap.put_updates, 1);
    assert_eq!(snap.evict_calls, 6);
    assert_eq!(snap.evicted_entries, 2);
    assert_eq!(snap.stale_skips, 1);
    assert_eq!(snap.compactions, 1);
    assert_eq!(snap.compacted_slots, 3);
    assert_eq!(snap.remove_calls, 1);
    assert_eq!(snap.removed_entries, 1);
}

#[test]
fn gauges_reflect_current_state() {
    let cache = churned_cache();
    let snap = cache.metrics_snapshot();

    assert_eq!(snap.len, 3);
    assert_eq!(snap.groups, 1);
    assert_eq!(snap.order_len, 3);
    assert_eq!(snap.capacity, 3);
}

#[test]
fn read_path_counters_are_shared_by_clones() {
    let cache = churned_cache();
    let other = cache.clone();

    assert!(cache.get(&1, &6).is_some());
    assert!(other.get(&1, &1).is_none());
    assert_eq!(other.get_with(&1, &5, |v| *v), Some(5));

    let snap = cache.metrics_snapshot();
    assert_eq!(snap.get_hits, 2);
    assert_eq!(snap.get_misses, 1);
}

#[test]
fn load_and_group_removal_are_counted() {
    let cache: CappedGroupedCache<u64, u64, (u64, u64)> = CappedGroupedCache::new(10);
    cache.load(vec![(1, 1), (1, 2), (2, 1)], |&(g, i)| (g, i));
    cache.group_remove(&1);

    let snap = cache.metrics_snapshot();
    assert_eq!(snap.loads, 1);
    assert_eq!(snap.remove_calls, 1);
    assert_eq!(snap.removed_entries, 2);
    assert_eq!(snap.evict_calls, 0);
}

#[test]
fn reset_clears_counters_not_gauges() {
    let cache = churned_cache();
    let _ = cache.get(&1, &6);
    cache.reset_metrics();

    let snap = cache.metrics_snapshot();
    assert_eq!(
        snap,
        GroupedMetricsSnapshot {
            len: 3,
            groups: 1,
            order_len: 3,
            capacity: 3,
            ..Default::default()
        }
    );
}

#[test]
fn prometheus_export_of_live_cache() {
    let cache = churned_cache();
    let exporter = PrometheusTextExporter::new("msgcache", Vec::new());
    exporter.export(&cache.metrics_snapshot());

    let text = String::from_utf8(exporter.into_inner()).unwrap();
    assert!(text.contains("# TYPE msgcache_evicted_entries_total counter\nmsgcache_evicted_entries_total 2\n"));
    assert!(text.contains("# TYPE msgcache_len gauge\nmsgcache_len 3\n"));
}
