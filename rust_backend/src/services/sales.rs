//! Fixed business questions over a store of sales transactions.
//!
//! [`SalesAnalytics`] is the entry point presentation layers call. Every
//! question is a short composition of [`aggregate`], ranking and
//! [`compare_trend`]; results come back as typed rows plus the number of
//! records a date-dependent question had to leave out.

use std::path::Path;

use anyhow::Context;
use log::info;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::algorithms::{
    aggregate, compare_trend, top_k, AggregateOutput, AggregateResult, MetricSpec, SortDirection,
    TrendDirection, TrendReport,
};
use crate::config::AnalyticsConfig;
use crate::core::{Dimension, Field, RecordStore, TransactionSource};
use crate::error::AnalyticsResult;

/// Rows answering one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult<T> {
    pub rows: Vec<T>,
    /// Records left out because their date or time could not be derived.
    pub excluded_records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodUsage {
    pub payment_method: String,
    pub transactions: u64,
    pub quantity: Decimal,
}

/// Best-ranked value of some dimension within one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchLeader {
    pub branch: String,
    pub leader: String,
    pub value: Decimal,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRating {
    pub city: String,
    pub category: String,
    pub average: Decimal,
    pub min: Decimal,
    pub max: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProfit {
    pub category: String,
    pub revenue: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftVolume {
    pub branch: String,
    pub shift: String,
    pub transactions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub branch: String,
    pub month: String,
    pub revenue: Decimal,
}

/// Answers to every question in one serializable bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    pub total_records: usize,
    pub payment_methods: QuestionResult<PaymentMethodUsage>,
    pub top_rated_categories: QuestionResult<BranchLeader>,
    pub busiest_days: QuestionResult<BranchLeader>,
    pub category_ratings: QuestionResult<CategoryRating>,
    pub category_profit: QuestionResult<CategoryProfit>,
    pub preferred_payment_methods: QuestionResult<BranchLeader>,
    pub shift_volume: QuestionResult<ShiftVolume>,
    pub revenue_decline: TrendReport,
    pub monthly_revenue: QuestionResult<MonthlyRevenue>,
}

/// Business-question façade over an immutable [`RecordStore`].
#[derive(Debug, Clone)]
pub struct SalesAnalytics {
    store: RecordStore,
    config: AnalyticsConfig,
}

fn key_part(row: &AggregateResult, index: usize) -> String {
    row.key.get(index).unwrap_or_default().to_string()
}

fn as_count(value: Decimal) -> u64 {
    value.to_u64().unwrap_or_default()
}

impl SalesAnalytics {
    /// Fails with [`crate::AnalyticsError::Configuration`] if `config` does not
    /// pass [`AnalyticsConfig::validate`].
    pub fn new(store: RecordStore, config: AnalyticsConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn with_defaults(store: RecordStore) -> Self {
        Self {
            store,
            config: AnalyticsConfig::default(),
        }
    }

    /// Loads records from `source` and, if given, settings from a TOML file.
    pub async fn load<S: TransactionSource + ?Sized>(
        source: &S,
        config_path: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => AnalyticsConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => AnalyticsConfig::default(),
        };
        let store = RecordStore::load(source)
            .await
            .context("Failed to load transaction records")?;
        Ok(Self::new(store, config)?)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    fn aggregate(
        &self,
        group_by: &[Dimension],
        metrics: &[MetricSpec],
    ) -> AnalyticsResult<AggregateOutput> {
        aggregate(self.store.records(), group_by, metrics)
    }

    /// Ranks `(branch, dimension)` groups by `metric` within each branch and
    /// keeps the configured top-k.
    fn branch_leaders(
        &self,
        dimension: Dimension,
        metric: MetricSpec,
    ) -> AnalyticsResult<QuestionResult<BranchLeader>> {
        let name = metric.name.clone();
        let output = self.aggregate(&[Dimension::Branch, dimension], &[metric])?;
        let ranked = output.rank_within(Dimension::Branch, &name, SortDirection::Descending)?;

        let rows = top_k(ranked, self.config.report.top_k)
            .into_iter()
            .map(|r| {
                Ok(BranchLeader {
                    branch: r.partition,
                    leader: key_part(&r.row, 1),
                    value: r.row.metric(&name)?,
                    rank: r.rank,
                })
            })
            .collect::<AnalyticsResult<Vec<_>>>()?;

        Ok(QuestionResult {
            rows,
            excluded_records: output.excluded,
        })
    }

    /// Transactions and quantity sold per payment method, busiest first.
    pub fn payment_method_usage(&self) -> AnalyticsResult<QuestionResult<PaymentMethodUsage>> {
        info!("Computing payment method usage");
        let mut output = self.aggregate(
            &[Dimension::PaymentMethod],
            &[
                MetricSpec::count("transactions"),
                MetricSpec::sum("quantity", Field::Quantity),
            ],
        )?;
        output.sort_by_metric("transactions", SortDirection::Descending)?;

        let rows = output
            .rows
            .iter()
            .map(|row| {
                Ok(PaymentMethodUsage {
                    payment_method: key_part(row, 0),
                    transactions: as_count(row.metric("transactions")?),
                    quantity: row.metric("quantity")?,
                })
            })
            .collect::<AnalyticsResult<Vec<_>>>()?;
        Ok(QuestionResult {
            rows,
            excluded_records: output.excluded,
        })
    }

    /// Category with the highest average rating in each branch.
    pub fn top_rated_category_per_branch(&self) -> AnalyticsResult<QuestionResult<BranchLeader>> {
        info!("Computing top-rated category per branch");
        self.branch_leaders(
            Dimension::Category,
            MetricSpec::mean("avg_rating", Field::Rating),
        )
    }

    /// Weekday with the most transactions in each branch.
    pub fn busiest_day_per_branch(&self) -> AnalyticsResult<QuestionResult<BranchLeader>> {
        info!("Computing busiest weekday per branch");
        self.branch_leaders(Dimension::DayName, MetricSpec::count("transactions"))
    }

    /// Most frequently used payment method in each branch.
    pub fn preferred_payment_method_per_branch(
        &self,
    ) -> AnalyticsResult<QuestionResult<BranchLeader>> {
        info!("Computing preferred payment method per branch");
        self.branch_leaders(Dimension::PaymentMethod, MetricSpec::count("transactions"))
    }

    /// Average, minimum and maximum rating of each category per city.
    pub fn category_ratings_by_city(&self) -> AnalyticsResult<QuestionResult<CategoryRating>> {
        info!("Computing category ratings by city");
        let mut output = self.aggregate(
            &[Dimension::City, Dimension::Category],
            &[
                MetricSpec::mean("avg_rating", Field::Rating),
                MetricSpec::min("min_rating", Field::Rating),
                MetricSpec::max("max_rating", Field::Rating),
            ],
        )?;
        output.sort_by_key();

        let rows = output
            .rows
            .iter()
            .map(|row| {
                Ok(CategoryRating {
                    city: key_part(row, 0),
                    category: key_part(row, 1),
                    average: row.metric("avg_rating")?,
                    min: row.metric("min_rating")?,
                    max: row.metric("max_rating")?,
                })
            })
            .collect::<AnalyticsResult<Vec<_>>>()?;
        Ok(QuestionResult {
            rows,
            excluded_records: output.excluded,
        })
    }

    /// Total profit (`total * profit_margin`) per category, highest first.
    pub fn profit_by_category(&self) -> AnalyticsResult<QuestionResult<CategoryProfit>> {
        info!("Computing profit by category");
        let mut output = self.aggregate(
            &[Dimension::Category],
            &[
                MetricSpec::sum("revenue", Field::Total),
                MetricSpec::sum("profit", Field::Profit),
            ],
        )?;
        output.sort_by_metric("profit", SortDirection::Descending)?;

        let rows = output
            .rows
            .iter()
            .map(|row| {
                Ok(CategoryProfit {
                    category: key_part(row, 0),
                    revenue: row.metric("revenue")?,
                    profit: row.metric("profit")?,
                })
            })
            .collect::<AnalyticsResult<Vec<_>>>()?;
        Ok(QuestionResult {
            rows,
            excluded_records: output.excluded,
        })
    }

    /// Transactions per branch and shift, ordered by branch then volume.
    pub fn shift_volume_per_branch(&self) -> AnalyticsResult<QuestionResult<ShiftVolume>> {
        info!("Computing shift volume per branch");
        let output = self.aggregate(
            &[Dimension::Branch, Dimension::Shift],
            &[MetricSpec::count("transactions")],
        )?;

        let mut rows = output
            .rows
            .iter()
            .map(|row| {
                Ok(ShiftVolume {
                    branch: key_part(row, 0),
                    shift: key_part(row, 1),
                    transactions: as_count(row.metric("transactions")?),
                })
            })
            .collect::<AnalyticsResult<Vec<_>>>()?;
        rows.sort_by(|a, b| {
            a.branch
                .cmp(&b.branch)
                .then_with(|| b.transactions.cmp(&a.transactions))
                .then_with(|| a.shift.cmp(&b.shift))
        });
        Ok(QuestionResult {
            rows,
            excluded_records: output.excluded,
        })
    }

    /// Branches whose revenue fell the most between the configured base and
    /// comparison years.
    pub fn revenue_decline(&self) -> AnalyticsResult<TrendReport> {
        let trend = &self.config.trend;
        info!(
            "Computing revenue decline {} -> {}",
            trend.base_year, trend.comparison_year
        );
        compare_trend(
            self.store.records(),
            Dimension::Branch,
            Field::Total,
            trend.base_period(),
            trend.comparison_period(),
            TrendDirection::Decrease,
            trend.limit,
        )
    }

    /// Revenue per branch and calendar month, in calendar order.
    pub fn monthly_revenue_by_branch(&self) -> AnalyticsResult<QuestionResult<MonthlyRevenue>> {
        info!("Computing monthly revenue by branch");
        let mut output = self.aggregate(
            &[Dimension::Branch, Dimension::Month],
            &[MetricSpec::sum("revenue", Field::Total)],
        )?;
        output.sort_by_key();

        let rows = output
            .rows
            .iter()
            .map(|row| {
                Ok(MonthlyRevenue {
                    branch: key_part(row, 0),
                    month: key_part(row, 1),
                    revenue: row.metric("revenue")?,
                })
            })
            .collect::<AnalyticsResult<Vec<_>>>()?;
        Ok(QuestionResult {
            rows,
            excluded_records: output.excluded,
        })
    }

    /// Answers every question.
    pub fn report(&self) -> AnalyticsResult<SalesReport> {
        info!("Building sales report over {} records", self.store.len());
        Ok(SalesReport {
            total_records: self.store.len(),
            payment_methods: self.payment_method_usage()?,
            top_rated_categories: self.top_rated_category_per_branch()?,
            busiest_days: self.busiest_day_per_branch()?,
            category_ratings: self.category_ratings_by_city()?,
            category_profit: self.profit_by_category()?,
            preferred_payment_methods: self.preferred_payment_method_per_branch()?,
            shift_volume: self.shift_volume_per_branch()?,
            revenue_decline: self.revenue_decline()?,
            monthly_revenue: self.monthly_revenue_by_branch()?,
        })
    }
}
