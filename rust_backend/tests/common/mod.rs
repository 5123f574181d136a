//! Shared fixtures for integration tests.
#![allow(dead_code)]

use retail_analytics::core::TransactionRecord;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Builder for transaction fixtures. Keeps `total == unit_price * quantity`.
pub struct SaleBuilder {
    record: TransactionRecord,
}

impl SaleBuilder {
    pub fn new(branch: &str) -> Self {
        Self {
            record: TransactionRecord {
                invoice_id: format!("{}-0", branch),
                branch: branch.to_string(),
                city: "Dallas".to_string(),
                category: "Fashion accessories".to_string(),
                unit_price: dec!(10),
                quantity: 1,
                total: dec!(10),
                payment_method: "Cash".to_string(),
                rating: dec!(5),
                profit_margin: dec!(0.33),
                transaction_date: "03/01/22".to_string(),
                transaction_time: "10:00:00".to_string(),
            },
        }
    }

    pub fn invoice(mut self, id: &str) -> Self {
        self.record.invoice_id = id.to_string();
        self
    }

    pub fn city(mut self, city: &str) -> Self {
        self.record.city = city.to_string();
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.record.category = category.to_string();
        self
    }

    pub fn payment(mut self, method: &str) -> Self {
        self.record.payment_method = method.to_string();
        self
    }

    /// Sets a single-unit sale worth `total`.
    pub fn total(self, total: Decimal) -> Self {
        self.priced(total, 1)
    }

    pub fn priced(mut self, unit_price: Decimal, quantity: u32) -> Self {
        self.record.unit_price = unit_price;
        self.record.quantity = quantity;
        self.record.total = unit_price * Decimal::from(quantity);
        self
    }

    pub fn rating(mut self, rating: Decimal) -> Self {
        self.record.rating = rating;
        self
    }

    pub fn margin(mut self, margin: Decimal) -> Self {
        self.record.profit_margin = margin;
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.record.transaction_date = date.to_string();
        self
    }

    pub fn time(mut self, time: &str) -> Self {
        self.record.transaction_time = time.to_string();
        self
    }

    pub fn build(self) -> TransactionRecord {
        self.record
    }
}

pub fn sale(branch: &str) -> SaleBuilder {
    SaleBuilder::new(branch)
}
