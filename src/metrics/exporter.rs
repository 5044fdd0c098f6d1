use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::GroupedMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for grouped cache metrics snapshots.
///
/// Writes in the Prometheus text exposition format so it can be scraped by
/// Prometheus or forwarded to an OpenTelemetry collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the exporter and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_metric(&self, kind: &str, name: &str, value: u64) {
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_metric("counter", &self.metric_name(suffix), value);
    }

    fn write_gauge(&self, suffix: &str, value: usize) {
        self.write_metric("gauge", &self.metric_name(suffix), value as u64);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<GroupedMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &GroupedMetricsSnapshot) {
        self.write_counter("get_hits_total", snapshot.get_hits);
        self.write_counter("get_misses_total", snapshot.get_misses);
        self.write_counter("put_calls_total", snapshot.put_calls);
        self.write_counter("put_new_total", snapshot.put_new);
        self.write_counter("put_updates_total", snapshot.put_updates);
        self.write_counter("evict_calls_total", snapshot.evict_calls);
        self.write_counter("evicted_entries_total", snapshot.evicted_entries);
        self.write_counter("stale_skips_total", snapshot.stale_skips);
        self.write_counter("compactions_total", snapshot.compactions);
        self.write_counter("compacted_slots_total", snapshot.compacted_slots);
        self.write_counter("remove_calls_total", snapshot.remove_calls);
        self.write_counter("removed_entries_total", snapshot.removed_entries);
        self.write_counter("loads_total", snapshot.loads);
        self.write_gauge("len", snapshot.len);
        self.write_gauge("groups", snapshot.groups);
        self.write_gauge("order_len", snapshot.order_len);
        self.write_gauge("capacity", snapshot.capacity);
    }
}
