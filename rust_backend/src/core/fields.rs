//! Grouping dimensions, numeric fields and composite group keys.

use std::fmt;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::record::TransactionRecord;
use crate::error::AnalyticsResult;
use crate::temporal;

/// A categorical attribute records can be grouped or partitioned by.
///
/// `DayName`, `Shift`, `Year` and `Month` are synthetic: they are derived from
/// the raw date/time text and can fail for a malformed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    Branch,
    City,
    Category,
    PaymentMethod,
    DayName,
    Shift,
    Year,
    Month,
}

impl Dimension {
    /// Returns `true` for dimensions derived from the transaction date or time.
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            Dimension::DayName | Dimension::Shift | Dimension::Year | Dimension::Month
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Branch => "branch",
            Dimension::City => "city",
            Dimension::Category => "category",
            Dimension::PaymentMethod => "payment_method",
            Dimension::DayName => "day_name",
            Dimension::Shift => "shift",
            Dimension::Year => "year",
            Dimension::Month => "month",
        }
    }

    /// Extracts this dimension's value from a record.
    ///
    /// Months are rendered as `YYYY-MM` so that lexical and calendar order agree.
    pub fn value_of(self, record: &TransactionRecord) -> AnalyticsResult<String> {
        let value = match self {
            Dimension::Branch => record.branch.clone(),
            Dimension::City => record.city.clone(),
            Dimension::Category => record.category.clone(),
            Dimension::PaymentMethod => record.payment_method.clone(),
            Dimension::DayName => temporal::day_name(record.date()?).to_string(),
            Dimension::Shift => temporal::derive_shift(record.time()?).to_string(),
            Dimension::Year => record.date()?.year().to_string(),
            Dimension::Month => record.date()?.format("%Y-%m").to_string(),
        };
        Ok(value)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A numeric source field a reducer can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    UnitPrice,
    Quantity,
    Total,
    Rating,
    ProfitMargin,
    /// `unit_price * quantity`
    Revenue,
    /// `total * profit_margin`
    Profit,
}

impl Field {
    pub fn value_of(self, record: &TransactionRecord) -> Decimal {
        match self {
            Field::UnitPrice => record.unit_price,
            Field::Quantity => Decimal::from(record.quantity),
            Field::Total => record.total,
            Field::Rating => record.rating,
            Field::ProfitMargin => record.profit_margin,
            Field::Revenue => record.revenue(),
            Field::Profit => record.profit(),
        }
    }
}

/// Ordered tuple of dimension values identifying one group.
///
/// Equality, hashing and ordering are structural over the values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey(pub Vec<String>);

impl GroupKey {
    /// Builds the key for `record` over `dimensions`, failing if any
    /// synthetic dimension cannot be derived.
    pub fn for_record(
        dimensions: &[Dimension],
        record: &TransactionRecord,
    ) -> AnalyticsResult<Self> {
        dimensions
            .iter()
            .map(|dimension| dimension.value_of(record))
            .collect::<AnalyticsResult<Vec<_>>>()
            .map(GroupKey)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

impl<S: Into<String>> FromIterator<S> for GroupKey {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        GroupKey(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use rust_decimal_macros::dec;

    fn record(date: &str, time: &str) -> TransactionRecord {
        TransactionRecord {
            invoice_id: "INV-1".to_string(),
            branch: "WALM001".to_string(),
            city: "Dallas".to_string(),
            category: "Home and lifestyle".to_string(),
            unit_price: dec!(12.50),
            quantity: 4,
            total: dec!(50.00),
            payment_method: "Cash".to_string(),
            rating: dec!(7.5),
            profit_margin: dec!(0.33),
            transaction_date: date.to_string(),
            transaction_time: time.to_string(),
        }
    }

    #[test]
    fn test_temporal_dimensions() {
        let r = record("15/03/22", "18:00:00");
        assert_eq!(Dimension::DayName.value_of(&r).unwrap(), "Tuesday");
        assert_eq!(Dimension::Shift.value_of(&r).unwrap(), "Evening");
        assert_eq!(Dimension::Year.value_of(&r).unwrap(), "2022");
        assert_eq!(Dimension::Month.value_of(&r).unwrap(), "2022-03");
    }

    #[test]
    fn test_group_key_fails_only_for_temporal_dimensions() {
        let r = record("31/02/22", "10:00:00");
        let plain = GroupKey::for_record(&[Dimension::Branch, Dimension::Category], &r).unwrap();
        assert_eq!(plain, GroupKey::from_iter(["WALM001", "Home and lifestyle"]));

        let err = GroupKey::for_record(&[Dimension::Branch, Dimension::DayName], &r).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidDate(_)));
    }

    #[test]
    fn test_derived_fields_are_exact() {
        let r = record("01/01/22", "09:00:00");
        assert_eq!(Field::Revenue.value_of(&r), dec!(50.00));
        assert_eq!(Field::Profit.value_of(&r), dec!(16.5000));
        assert_eq!(Field::Quantity.value_of(&r), dec!(4));
    }
}
