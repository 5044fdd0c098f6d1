pub use crate::ds::OrderLog;
pub use crate::error::{ConfigError, InvariantError};
pub use crate::policy::grouped_fifo::{
    CappedGroupedCache, CappedGroupedCacheBuilder, GroupedFifoCore, GroupedReadGuard,
};
pub use crate::traits::{ConcurrentCache, GroupedCache};

#[cfg(feature = "persist")]
pub use crate::error::PersistError;
#[cfg(feature = "persist")]
pub use crate::persist::{JsonSnapshotStore, SnapshotConfig};

#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::GroupedMetricsSnapshot;
