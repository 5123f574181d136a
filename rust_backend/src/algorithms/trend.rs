//! Cross-period comparison of a summed metric per partition.
//!
//! Each period is aggregated independently, the two results are joined on
//! the partition value, and partitions missing from either side are dropped
//! rather than zero-filled. A zero base-period value makes the percentage
//! change undefined; such partitions are dropped and reported, as are
//! partitions whose change does not fit in a `Decimal`.
//!
//! Periods are [`PeriodFilter`]s: a [`Period`] window over the transaction
//! date, or any `Fn(&TransactionRecord) -> bool` predicate.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::algorithms::aggregation::{MetricSpec, PartialAggregate};
use crate::core::{Dimension, Field, TransactionRecord};
use crate::error::{AnalyticsError, AnalyticsResult};

const VALUE: &str = "value";

/// A calendar window records are assigned to by transaction date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    /// One calendar year.
    Year(i32),
    /// Inclusive date range.
    Between { start: NaiveDate, end: NaiveDate },
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Period::Year(year) => date.year() == year,
            Period::Between { start, end } => start <= date && date <= end,
        }
    }

    fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            Period::Year(year) => Some((
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year, 12, 31)?,
            )),
            Period::Between { start, end } => Some((start, end)),
        }
    }

    /// Returns `true` if some date falls in both periods.
    pub fn overlaps(&self, other: &Period) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some((s1, e1)), Some((s2, e2))) => s1 <= e2 && s2 <= e1,
            _ => false,
        }
    }
}

/// Decides which records belong to one side of a trend comparison.
pub trait PeriodFilter {
    /// `Err` excludes the record from the comparison altogether.
    fn matches(&self, record: &TransactionRecord) -> AnalyticsResult<bool>;

    /// Calendar window covered by the filter, if it has one.
    fn window(&self) -> Option<Period> {
        None
    }
}

impl PeriodFilter for Period {
    fn matches(&self, record: &TransactionRecord) -> AnalyticsResult<bool> {
        Ok(self.contains(record.date()?))
    }

    fn window(&self) -> Option<Period> {
        Some(*self)
    }
}

impl<F> PeriodFilter for F
where
    F: Fn(&TransactionRecord) -> bool,
{
    fn matches(&self, record: &TransactionRecord) -> AnalyticsResult<bool> {
        Ok(self(record))
    }
}

/// Which movement between the base period and the comparison period to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendDirection {
    /// Keep partitions where the base value exceeds the comparison value.
    Decrease,
    /// Keep partitions where the comparison value exceeds the base value.
    Increase,
}

/// Metric values of one partition in both periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendDelta {
    pub partition: String,
    /// Base-period value.
    pub value_a: Decimal,
    /// Comparison-period value.
    pub value_b: Decimal,
    /// `(value_a - value_b) / value_a * 100`, rounded to two places.
    /// Positive for a decrease.
    pub percent_change: Decimal,
}

/// Output of [`compare_trend`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendReport {
    pub deltas: Vec<TrendDelta>,
    /// Partitions present in both periods whose base value is zero.
    pub undefined: Vec<String>,
    /// Partitions present in only one of the two periods.
    pub unmatched: Vec<String>,
    /// Partitions whose percentage change is out of `Decimal` range.
    pub overflowed: Vec<String>,
    /// Records whose date (or partition value) could not be derived.
    pub excluded_records: usize,
}

/// `(value_a - value_b) / value_a * 100`, rounded half away from zero to two
/// decimal places.
///
/// Fails with [`AnalyticsError::UndefinedTrend`] when `value_a` is zero and
/// with [`AnalyticsError::TrendOverflow`] when the result is out of range.
pub fn percent_change(
    partition: &str,
    value_a: Decimal,
    value_b: Decimal,
) -> AnalyticsResult<Decimal> {
    if value_a.is_zero() {
        return Err(AnalyticsError::UndefinedTrend(partition.to_string()));
    }
    let overflow = || AnalyticsError::TrendOverflow(partition.to_string());
    let change = value_a
        .checked_sub(value_b)
        .and_then(|diff| diff.checked_div(value_a))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(overflow)?;
    Ok(change.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Compares the sum of `field` per `partition_by` value between `period_a`
/// (the base) and `period_b`, keeps movements in `direction`, and returns the
/// `limit` largest by magnitude of percentage change.
///
/// Equal percentage changes are ordered by partition value. Records a
/// filter rejects with an error, or whose partition value cannot be derived,
/// are counted in [`TrendReport::excluded_records`].
///
/// # Examples
///
/// ```no_run
/// use retail_analytics::algorithms::{compare_trend, Period, TrendDirection};
/// use retail_analytics::core::{Dimension, Field, RecordStore};
///
/// # fn example(store: &RecordStore) -> retail_analytics::AnalyticsResult<()> {
/// let report = compare_trend(
///     store.records(),
///     Dimension::Branch,
///     Field::Total,
///     Period::Year(2022),
///     Period::Year(2023),
///     TrendDirection::Decrease,
///     5,
/// )?;
/// for delta in &report.deltas {
///     println!("{}: {}%", delta.partition, delta.percent_change);
/// }
/// # Ok(())
/// # }
/// ```
pub fn compare_trend<A, B>(
    records: &[TransactionRecord],
    partition_by: Dimension,
    field: Field,
    period_a: A,
    period_b: B,
    direction: TrendDirection,
    limit: usize,
) -> AnalyticsResult<TrendReport>
where
    A: PeriodFilter,
    B: PeriodFilter,
{
    if let (Some(a), Some(b)) = (period_a.window(), period_b.window()) {
        if a.overlaps(&b) {
            warn!("Trend periods {:?} and {:?} overlap", a, b);
        }
    }

    let metrics = [MetricSpec::sum(VALUE, field)];
    let mut side_a = PartialAggregate::new(&[partition_by], &metrics);
    let mut side_b = PartialAggregate::new(&[partition_by], &metrics);
    let mut excluded = 0;

    for record in records {
        if partition_by.is_temporal() && partition_by.value_of(record).is_err() {
            debug!(
                "Excluding invoice {} from trend: no {} value",
                record.invoice_id, partition_by
            );
            excluded += 1;
            continue;
        }
        match (period_a.matches(record), period_b.matches(record)) {
            (Ok(in_a), Ok(in_b)) => {
                if in_a {
                    side_a.accumulate(record);
                }
                if in_b {
                    side_b.accumulate(record);
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                debug!("Excluding invoice {} from trend: {}", record.invoice_id, e);
                excluded += 1;
            }
        }
    }

    let side_a = side_a.finish()?;
    let side_b = side_b.finish()?;

    let mut values_b: HashMap<String, Decimal> = HashMap::with_capacity(side_b.rows.len());
    for row in &side_b.rows {
        if let Some(partition) = row.key.get(0) {
            values_b.insert(partition.to_string(), row.metric(VALUE)?);
        }
    }

    let mut report = TrendReport {
        excluded_records: excluded,
        ..TrendReport::default()
    };

    for row in &side_a.rows {
        let Some(partition) = row.key.get(0) else {
            continue;
        };
        let value_a = row.metric(VALUE)?;
        let Some(value_b) = values_b.remove(partition) else {
            report.unmatched.push(partition.to_string());
            continue;
        };

        if value_a.is_zero() {
            debug!("Undefined trend for {}: zero base value", partition);
            report.undefined.push(partition.to_string());
            continue;
        }
        let keep = match direction {
            TrendDirection::Decrease => value_a > value_b,
            TrendDirection::Increase => value_b > value_a,
        };
        if !keep {
            continue;
        }

        match percent_change(partition, value_a, value_b) {
            Ok(percent_change) => report.deltas.push(TrendDelta {
                partition: partition.to_string(),
                value_a,
                value_b,
                percent_change,
            }),
            Err(e) => {
                warn!("{}", e);
                report.overflowed.push(partition.to_string());
            }
        }
    }
    report.unmatched.extend(values_b.into_keys());

    report.deltas.sort_by(|a, b| {
        b.percent_change
            .abs()
            .cmp(&a.percent_change.abs())
            .then_with(|| a.partition.cmp(&b.partition))
    });
    report.deltas.truncate(limit);
    report.undefined.sort();
    report.unmatched.sort();
    report.overflowed.sort();

    debug!(
        "Trend by {}: {} deltas, {} undefined, {} unmatched, {} overflowed",
        partition_by,
        report.deltas.len(),
        report.undefined.len(),
        report.unmatched.len(),
        report.overflowed.len()
    );
    Ok(report)
}
