//! The transaction line item consumed by every analytics operation.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsResult;
use crate::temporal;

/// One sales line item, as handed over by the ingestion collaborator.
///
/// Monetary and rating attributes are exact decimals. The date and time are
/// kept in their external textual form (`dd/mm/yy` and `HH:MM:SS`) and are
/// only interpreted when a date-dependent dimension asks for them, so one
/// malformed value never prevents the record from taking part in
/// date-independent aggregations.
///
/// # Examples
///
/// ```
/// use retail_analytics::core::TransactionRecord;
/// use rust_decimal::Decimal;
///
/// let record = TransactionRecord {
///     invoice_id: "750-67-8428".to_string(),
///     branch: "WALM003".to_string(),
///     city: "San Antonio".to_string(),
///     category: "Health and beauty".to_string(),
///     unit_price: Decimal::new(7469, 2),
///     quantity: 7,
///     total: Decimal::new(52283, 2),
///     payment_method: "Ewallet".to_string(),
///     rating: Decimal::new(91, 1),
///     profit_margin: Decimal::new(48, 2),
///     transaction_date: "05/01/19".to_string(),
///     transaction_time: "13:08:00".to_string(),
/// };
///
/// assert_eq!(record.revenue(), Decimal::new(52283, 2));
/// assert_eq!(record.date().unwrap().to_string(), "2019-01-05");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub invoice_id: String,
    pub branch: String,
    pub city: String,
    pub category: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub total: Decimal,
    pub payment_method: String,
    pub rating: Decimal,
    pub profit_margin: Decimal,
    pub transaction_date: String,
    pub transaction_time: String,
}

impl TransactionRecord {
    /// `unit_price * quantity`, computed exactly.
    pub fn revenue(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// `total * profit_margin`.
    ///
    /// The margin is an opaque multiplier supplied by ingestion; it is not
    /// assumed to lie within `[0, 1]`.
    pub fn profit(&self) -> Decimal {
        self.total * self.profit_margin
    }

    /// Parses the transaction date (day/month/year).
    pub fn date(&self) -> AnalyticsResult<NaiveDate> {
        temporal::parse_date(&self.transaction_date)
    }

    /// Parses the transaction clock time.
    pub fn time(&self) -> AnalyticsResult<NaiveTime> {
        temporal::parse_time(&self.transaction_time)
    }
}
