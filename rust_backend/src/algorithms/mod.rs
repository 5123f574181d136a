//! Analytics computation layer.
//!
//! Grouped aggregation is the shared primitive; ranking and trend comparison
//! are built on top of it.
//!
//! # Components
//!
//! - [`aggregation`]: Group by one or more dimensions and reduce with count, sum, min, max, mean
//! - [`ranking`]: Competition ranking within partitions and top-k filtering
//! - [`trend`]: Per-partition comparison of a summed metric between two periods
//!
//! # Example
//!
//! ```
//! use retail_analytics::algorithms::{aggregate, top_k, MetricSpec, SortDirection};
//! use retail_analytics::core::{Dimension, Field, TransactionRecord};
//!
//! # fn example(records: &[TransactionRecord]) -> retail_analytics::AnalyticsResult<()> {
//! let by_category = aggregate(
//!     records,
//!     &[Dimension::Branch, Dimension::Category],
//!     &[MetricSpec::mean("avg_rating", Field::Rating)],
//! )?;
//! let best = top_k(by_category.rank_within(Dimension::Branch, "avg_rating", SortDirection::Descending)?, 1);
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod ranking;
pub mod trend;

pub use aggregation::{
    aggregate, aggregate_parallel, Accumulator, AggregateOutput, AggregateResult, MetricSpec,
    PartialAggregate, Reducer,
};
pub use ranking::{rank_within_partition, top_k, RankedResult, SortDirection};
pub use trend::{
    compare_trend, percent_change, Period, PeriodFilter, TrendDelta, TrendDirection, TrendReport,
};
