//! Per-partition ranking with standard competition ("RANK") tie semantics.
//!
//! Rows sharing a metric value share a rank and the next distinct value
//! skips ahead, so a row's rank is always `1 + number of strictly better
//! rows in its partition`. Dense ranking or row numbering would change which
//! rows survive a top-k filter.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::algorithms::aggregation::{position_of, AggregateOutput, AggregateResult};
use crate::core::Dimension;
use crate::error::{AnalyticsError, AnalyticsResult};

/// Which end of the ordering counts as "best".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Compares two values so that the better one sorts first.
    pub fn order<T: Ord>(self, a: &T, b: &T) -> Ordering {
        match self {
            SortDirection::Ascending => a.cmp(b),
            SortDirection::Descending => b.cmp(a),
        }
    }
}

/// An aggregate row with its rank inside its partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedResult {
    pub partition: String,
    pub rank: usize,
    pub row: AggregateResult,
}

/// Ranks `rows` within each value of `partition_by`, ordered by the metric
/// `order_by`.
///
/// `group_by` describes the layout of each row's key and must contain
/// `partition_by`. Output is ordered by partition, then rank, then key.
///
/// # Examples
///
/// ```
/// use retail_analytics::algorithms::{rank_within_partition, AggregateResult, SortDirection};
/// use retail_analytics::core::{Dimension, GroupKey};
/// use rust_decimal::Decimal;
///
/// let rows = vec![
///     AggregateResult { key: GroupKey::from_iter(["A", "Cash"]), metrics: vec![("n".into(), Decimal::from(3))] },
///     AggregateResult { key: GroupKey::from_iter(["A", "Card"]), metrics: vec![("n".into(), Decimal::from(3))] },
///     AggregateResult { key: GroupKey::from_iter(["A", "Ewallet"]), metrics: vec![("n".into(), Decimal::from(1))] },
/// ];
/// let ranked = rank_within_partition(
///     &rows,
///     &[Dimension::Branch, Dimension::PaymentMethod],
///     Dimension::Branch,
///     "n",
///     SortDirection::Descending,
/// ).unwrap();
///
/// let ranks: Vec<usize> = ranked.iter().map(|r| r.rank).collect();
/// assert_eq!(ranks, vec![1, 1, 3]);
/// ```
pub fn rank_within_partition(
    rows: &[AggregateResult],
    group_by: &[Dimension],
    partition_by: Dimension,
    order_by: &str,
    direction: SortDirection,
) -> AnalyticsResult<Vec<RankedResult>> {
    let index = position_of(group_by, partition_by)?;

    let mut partitions: BTreeMap<&str, Vec<(Decimal, &AggregateResult)>> = BTreeMap::new();
    for row in rows {
        let partition = row
            .key
            .get(index)
            .ok_or_else(|| AnalyticsError::UnknownDimension(partition_by.to_string()))?;
        let value = row.metric(order_by)?;
        partitions.entry(partition).or_default().push((value, row));
    }

    let mut ranked = Vec::with_capacity(rows.len());
    for (partition, mut members) in partitions {
        members.sort_by(|(va, ra), (vb, rb)| {
            direction.order(va, vb).then_with(|| ra.key.cmp(&rb.key))
        });

        let mut rank = 0;
        let mut previous: Option<Decimal> = None;
        for (position, (value, row)) in members.into_iter().enumerate() {
            if previous != Some(value) {
                rank = position + 1;
                previous = Some(value);
            }
            ranked.push(RankedResult {
                partition: partition.to_string(),
                rank,
                row: row.clone(),
            });
        }
    }

    debug!(
        "Ranked {} rows by '{}' within {}",
        ranked.len(),
        order_by,
        partition_by
    );
    Ok(ranked)
}

/// Keeps rows ranked `k` or better. Ties at the cut-off all survive.
pub fn top_k(ranked: Vec<RankedResult>, k: usize) -> Vec<RankedResult> {
    ranked.into_iter().filter(|r| r.rank <= k).collect()
}

impl AggregateOutput {
    /// Ranks this output's rows; see [`rank_within_partition`].
    pub fn rank_within(
        &self,
        partition_by: Dimension,
        order_by: &str,
        direction: SortDirection,
    ) -> AnalyticsResult<Vec<RankedResult>> {
        rank_within_partition(&self.rows, &self.group_by, partition_by, order_by, direction)
    }
}
