pub mod aggregator;
pub mod delta;
pub mod reports;
pub mod rollup;
pub mod shelf;
pub mod store;
pub mod tracker;

pub use aggregator::RangeAggregator;
pub use delta::{session_delta, session_deltas};
pub use reports::{Analytics, PeriodComparison};
pub use rollup::{PeriodKind, RollupSeriesBuilder, RollupSpan};
pub use shelf::{group_by_status, ShelfGroups};
pub use store::{MemoryStore, ReadingStore};
pub use tracker::{ProgressTracker, ProgressUpdate};
