//! Grouped aggregation over transaction records.
//!
//! Records are keyed by an ordered list of [`Dimension`]s and every group
//! carries one [`Accumulator`] per requested metric. Accumulators hold
//! count, sum, min and max, all of which merge associatively, so shards of
//! the input can be folded independently and combined afterwards. Means are
//! only ever computed from a merged sum and count.

use std::collections::HashMap;

use log::{debug, warn};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{Dimension, Field, GroupKey, TransactionRecord};
use crate::error::{AnalyticsError, AnalyticsResult};

/// Function collapsing a group into one scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reducer {
    Count,
    Sum,
    Min,
    Max,
    Mean,
}

/// One output column: `name = reducer(field)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub field: Field,
    pub reducer: Reducer,
}

impl MetricSpec {
    pub fn new(name: impl Into<String>, field: Field, reducer: Reducer) -> Self {
        Self {
            name: name.into(),
            field,
            reducer,
        }
    }

    /// Number of records in the group. The field is irrelevant.
    pub fn count(name: impl Into<String>) -> Self {
        Self::new(name, Field::Quantity, Reducer::Count)
    }

    pub fn sum(name: impl Into<String>, field: Field) -> Self {
        Self::new(name, field, Reducer::Sum)
    }

    pub fn min(name: impl Into<String>, field: Field) -> Self {
        Self::new(name, field, Reducer::Min)
    }

    pub fn max(name: impl Into<String>, field: Field) -> Self {
        Self::new(name, field, Reducer::Max)
    }

    pub fn mean(name: impl Into<String>, field: Field) -> Self {
        Self::new(name, field, Reducer::Mean)
    }
}

/// Running statistics for one metric of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accumulator {
    pub count: u64,
    pub sum: Decimal,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl Accumulator {
    pub fn push(&mut self, value: Decimal) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn merge(&mut self, other: &Accumulator) {
        self.count += other.count;
        self.sum += other.sum;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Reduces the accumulated values.
    ///
    /// Mean, min and max of an empty accumulator fail with
    /// [`AnalyticsError::EmptyGroup`]; count and sum are zero.
    pub fn finish(&self, reducer: Reducer) -> AnalyticsResult<Decimal> {
        match reducer {
            Reducer::Count => Ok(Decimal::from(self.count)),
            Reducer::Sum => Ok(self.sum),
            Reducer::Min => self.min.ok_or(AnalyticsError::EmptyGroup),
            Reducer::Max => self.max.ok_or(AnalyticsError::EmptyGroup),
            Reducer::Mean => {
                if self.count == 0 {
                    return Err(AnalyticsError::EmptyGroup);
                }
                Ok(self.sum / Decimal::from(self.count))
            }
        }
    }
}

/// One group of an aggregation: its key plus the named metric values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub key: GroupKey,
    pub metrics: Vec<(String, Decimal)>,
}

impl AggregateResult {
    /// Value of the metric called `name`, if it was requested.
    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.metrics
            .iter()
            .find(|(metric, _)| metric == name)
            .map(|(_, value)| *value)
    }

    /// Like [`AggregateResult::get`] but failing with
    /// [`AnalyticsError::UnknownMetric`].
    pub fn metric(&self, name: &str) -> AnalyticsResult<Decimal> {
        self.get(name)
            .ok_or_else(|| AnalyticsError::UnknownMetric(name.to_string()))
    }
}

/// Result of one aggregation call.
///
/// Row order is unspecified; use [`AggregateOutput::sort_by_metric`] or
/// [`AggregateOutput::sort_by_key`] before presenting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateOutput {
    pub group_by: Vec<Dimension>,
    pub rows: Vec<AggregateResult>,
    /// Records left out because a synthetic dimension could not be derived.
    pub excluded: usize,
}

impl AggregateOutput {
    /// Position of `dimension` within each row's [`GroupKey`].
    pub fn position_of(&self, dimension: Dimension) -> AnalyticsResult<usize> {
        position_of(&self.group_by, dimension)
    }

    /// Looks up a group by its key values.
    pub fn find(&self, key: &GroupKey) -> Option<&AggregateResult> {
        self.rows.iter().find(|row| &row.key == key)
    }

    pub fn sort_by_key(&mut self) {
        self.rows.sort_by(|a, b| a.key.cmp(&b.key));
    }

    /// Orders rows by a metric, falling back to the key for equal values.
    pub fn sort_by_metric(
        &mut self,
        name: &str,
        direction: crate::algorithms::SortDirection,
    ) -> AnalyticsResult<()> {
        if let Some(row) = self.rows.iter().find(|row| row.get(name).is_none()) {
            debug!("Row {} lacks metric '{}'", row.key, name);
            return Err(AnalyticsError::UnknownMetric(name.to_string()));
        }
        self.rows.sort_by(|a, b| {
            direction
                .order(&a.get(name), &b.get(name))
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub(crate) fn position_of(group_by: &[Dimension], dimension: Dimension) -> AnalyticsResult<usize> {
    group_by
        .iter()
        .position(|d| *d == dimension)
        .ok_or_else(|| AnalyticsError::UnknownDimension(dimension.to_string()))
}

/// Unfinished aggregation state for one shard of the input.
#[derive(Debug, Clone)]
pub struct PartialAggregate {
    group_by: Vec<Dimension>,
    metrics: Vec<MetricSpec>,
    groups: HashMap<GroupKey, Vec<Accumulator>>,
    excluded: usize,
}

impl PartialAggregate {
    pub fn new(group_by: &[Dimension], metrics: &[MetricSpec]) -> Self {
        Self {
            group_by: group_by.to_vec(),
            metrics: metrics.to_vec(),
            groups: HashMap::new(),
            excluded: 0,
        }
    }

    /// Adds one record, or counts it as excluded if it cannot be keyed.
    pub fn accumulate(&mut self, record: &TransactionRecord) {
        let key = match GroupKey::for_record(&self.group_by, record) {
            Ok(key) => key,
            Err(e) => {
                debug!("Excluding invoice {} from grouping: {}", record.invoice_id, e);
                self.excluded += 1;
                return;
            }
        };

        let metric_count = self.metrics.len();
        let accumulators = self
            .groups
            .entry(key)
            .or_insert_with(|| vec![Accumulator::default(); metric_count]);
        for (accumulator, spec) in accumulators.iter_mut().zip(&self.metrics) {
            accumulator.push(spec.field.value_of(record));
        }
    }

    pub fn fold<'a, I>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        for record in records {
            self.accumulate(record);
        }
        self
    }

    /// Combines two shards built with the same grouping and metrics.
    pub fn merge(mut self, other: PartialAggregate) -> AnalyticsResult<Self> {
        if self.group_by != other.group_by || self.metrics != other.metrics {
            return Err(AnalyticsError::Configuration(
                "cannot merge partial aggregates with different groupings or metrics".to_string(),
            ));
        }

        self.excluded += other.excluded;
        for (key, theirs) in other.groups {
            match self.groups.get_mut(&key) {
                Some(ours) => {
                    for (a, b) in ours.iter_mut().zip(&theirs) {
                        a.merge(b);
                    }
                }
                None => {
                    self.groups.insert(key, theirs);
                }
            }
        }
        Ok(self)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn finish(self) -> AnalyticsResult<AggregateOutput> {
        if self.excluded > 0 {
            warn!(
                "{} records excluded from grouping by {:?}",
                self.excluded, self.group_by
            );
        }

        let metrics = self.metrics;
        let rows = self
            .groups
            .into_iter()
            .map(|(key, accumulators)| {
                let values = metrics
                    .iter()
                    .zip(&accumulators)
                    .map(|(spec, acc)| Ok((spec.name.clone(), acc.finish(spec.reducer)?)))
                    .collect::<AnalyticsResult<Vec<_>>>()?;
                Ok(AggregateResult {
                    key,
                    metrics: values,
                })
            })
            .collect::<AnalyticsResult<Vec<_>>>()?;

        Ok(AggregateOutput {
            group_by: self.group_by,
            rows,
            excluded: self.excluded,
        })
    }
}

/// Groups `records` by `group_by` and reduces each group with `metrics`.
///
/// An empty input yields an empty output, not an error.
///
/// # Examples
///
/// ```
/// use retail_analytics::algorithms::{aggregate, MetricSpec};
/// use retail_analytics::core::{Dimension, Field};
///
/// let output = aggregate(&[], &[Dimension::Branch], &[MetricSpec::sum("revenue", Field::Total)]).unwrap();
/// assert!(output.is_empty());
/// ```
pub fn aggregate(
    records: &[TransactionRecord],
    group_by: &[Dimension],
    metrics: &[MetricSpec],
) -> AnalyticsResult<AggregateOutput> {
    PartialAggregate::new(group_by, metrics)
        .fold(records)
        .finish()
}

/// Same result as [`aggregate`], computed over `shard_size`-record shards
/// in parallel and merged before reduction.
pub fn aggregate_parallel(
    records: &[TransactionRecord],
    group_by: &[Dimension],
    metrics: &[MetricSpec],
    shard_size: usize,
) -> AnalyticsResult<AggregateOutput> {
    let shard_size = shard_size.max(1);
    let merged = records
        .par_chunks(shard_size)
        .map(|shard| {
            Ok::<_, AnalyticsError>(PartialAggregate::new(group_by, metrics).fold(shard))
        })
        .try_reduce(
            || PartialAggregate::new(group_by, metrics),
            |a, b| a.merge(b),
        )?;
    debug!(
        "Merged {} shards into {} groups",
        records.len().div_ceil(shard_size),
        merged.group_count()
    );
    merged.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::SortDirection;
    use rust_decimal_macros::dec;

    fn record(branch: &str, payment: &str, total: Decimal, rating: Decimal) -> TransactionRecord {
        TransactionRecord {
            invoice_id: format!("{}-{}-{}", branch, payment, total),
            branch: branch.to_string(),
            city: "Houston".to_string(),
            category: "Electronic accessories".to_string(),
            unit_price: total,
            quantity: 1,
            total,
            payment_method: payment.to_string(),
            rating,
            profit_margin: dec!(0.48),
            transaction_date: "10/06/22".to_string(),
            transaction_time: "15:30:00".to_string(),
        }
    }

    #[test]
    fn test_sum_by_branch_and_payment() {
        let records = vec![
            record("A", "Cash", dec!(10), dec!(5)),
            record("A", "Cash", dec!(20), dec!(7)),
            record("A", "Card", dec!(5), dec!(9)),
        ];
        let output = aggregate(
            &records,
            &[Dimension::Branch, Dimension::PaymentMethod],
            &[MetricSpec::sum("total", Field::Total)],
        )
        .unwrap();

        assert_eq!(output.len(), 2);
        let cash = output.find(&GroupKey::from_iter(["A", "Cash"])).unwrap();
        let card = output.find(&GroupKey::from_iter(["A", "Card"])).unwrap();
        assert_eq!(cash.get("total"), Some(dec!(30)));
        assert_eq!(card.get("total"), Some(dec!(5)));
    }

    #[test]
    fn test_all_reducers() {
        let records = vec![
            record("A", "Cash", dec!(10.10), dec!(4.0)),
            record("A", "Cash", dec!(20.20), dec!(6.5)),
            record("A", "Cash", dec!(0.01), dec!(9.0)),
        ];
        let output = aggregate(
            &records,
            &[Dimension::Branch],
            &[
                MetricSpec::count("n"),
                MetricSpec::sum("total", Field::Total),
                MetricSpec::min("min_rating", Field::Rating),
                MetricSpec::max("max_rating", Field::Rating),
                MetricSpec::mean("avg_rating", Field::Rating),
            ],
        )
        .unwrap();

        let row = &output.rows[0];
        assert_eq!(row.get("n"), Some(dec!(3)));
        assert_eq!(row.get("total"), Some(dec!(30.31)));
        assert_eq!(row.get("min_rating"), Some(dec!(4.0)));
        assert_eq!(row.get("max_rating"), Some(dec!(9.0)));
        assert_eq!(row.get("avg_rating"), Some(dec!(6.5)));
    }

    #[test]
    fn test_decimal_sums_do_not_drift() {
        let records: Vec<_> = (0..10_000)
            .map(|_| record("A", "Cash", dec!(0.10), dec!(5)))
            .collect();
        let output =
            aggregate(&records, &[Dimension::Branch], &[MetricSpec::sum("t", Field::Total)])
                .unwrap();
        assert_eq!(output.rows[0].get("t"), Some(dec!(1000.00)));
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        let output = aggregate(&[], &[Dimension::City], &[MetricSpec::count("n")]).unwrap();
        assert!(output.is_empty());
        assert_eq!(output.excluded, 0);
    }

    #[test]
    fn test_undated_records_excluded_only_from_temporal_groupings() {
        let mut bad = record("A", "Cash", dec!(10), dec!(5));
        bad.transaction_date = "not a date".to_string();
        let records = vec![bad, record("A", "Cash", dec!(20), dec!(5))];

        let by_branch =
            aggregate(&records, &[Dimension::Branch], &[MetricSpec::count("n")]).unwrap();
        assert_eq!(by_branch.rows[0].get("n"), Some(dec!(2)));
        assert_eq!(by_branch.excluded, 0);

        let by_day = aggregate(
            &records,
            &[Dimension::Branch, Dimension::DayName],
            &[MetricSpec::count("n")],
        )
        .unwrap();
        assert_eq!(by_day.rows[0].get("n"), Some(dec!(1)));
        assert_eq!(by_day.excluded, 1);
    }

    #[test]
    fn test_empty_accumulator() {
        let acc = Accumulator::default();
        assert_eq!(acc.finish(Reducer::Count), Ok(Decimal::ZERO));
        assert_eq!(acc.finish(Reducer::Sum), Ok(Decimal::ZERO));
        assert_eq!(acc.finish(Reducer::Mean), Err(AnalyticsError::EmptyGroup));
        assert_eq!(acc.finish(Reducer::Max), Err(AnalyticsError::EmptyGroup));
    }

    #[test]
    fn test_merged_mean_is_weighted() {
        let mut left = Accumulator::default();
        left.push(dec!(10));
        let mut right = Accumulator::default();
        right.push(dec!(1));
        right.push(dec!(1));
        right.push(dec!(1));

        left.merge(&right);
        // (10 + 1 + 1 + 1) / 4, not (10 + 1) / 2
        assert_eq!(left.finish(Reducer::Mean), Ok(dec!(3.25)));
    }

    #[test]
    fn test_merge_rejects_mismatched_shapes() {
        let a = PartialAggregate::new(&[Dimension::Branch], &[MetricSpec::count("n")]);
        let b = PartialAggregate::new(&[Dimension::City], &[MetricSpec::count("n")]);
        assert!(matches!(a.merge(b), Err(AnalyticsError::Configuration(_))));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let records: Vec<_> = (0..257)
            .map(|i| {
                let branch = ["A", "B", "C"][i % 3];
                let payment = ["Cash", "Card"][i % 2];
                record(branch, payment, Decimal::from(i as u64), Decimal::from((i % 10) as u64))
            })
            .collect();
        let dims = [Dimension::Branch, Dimension::PaymentMethod];
        let metrics = [
            MetricSpec::count("n"),
            MetricSpec::sum("total", Field::Total),
            MetricSpec::mean("avg_rating", Field::Rating),
            MetricSpec::max("max_total", Field::Total),
        ];

        let mut sequential = aggregate(&records, &dims, &metrics).unwrap();
        let mut parallel = aggregate_parallel(&records, &dims, &metrics, 16).unwrap();
        sequential.sort_by_key();
        parallel.sort_by_key();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_sort_by_metric_breaks_ties_by_key() {
        let records = vec![
            record("B", "Cash", dec!(5), dec!(1)),
            record("A", "Cash", dec!(5), dec!(1)),
            record("C", "Cash", dec!(9), dec!(1)),
        ];
        let mut output =
            aggregate(&records, &[Dimension::Branch], &[MetricSpec::sum("t", Field::Total)])
                .unwrap();
        output.sort_by_metric("t", SortDirection::Descending).unwrap();
        let keys: Vec<_> = output.rows.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["(C)", "(A)", "(B)"]);

        assert!(matches!(
            output.sort_by_metric("missing", SortDirection::Ascending),
            Err(AnalyticsError::UnknownMetric(_))
        ));
    }
}
