//! Observability counters for the grouped cache (feature `metrics`).
//!
//! Recording, snapshotting and export are split into separate traits so the
//! cache only writes counters and consumers decide how to publish them.

pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
