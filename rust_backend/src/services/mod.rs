//! Service layer for the fixed business questions.
//!
//! Services sit between the record store and whatever presentation layer
//! renders the answers. They compose the algorithms into named questions and
//! shape the results into typed rows.

pub mod sales;

pub use sales::{
    BranchLeader, CategoryProfit, CategoryRating, MonthlyRevenue, PaymentMethodUsage,
    QuestionResult, SalesAnalytics, SalesReport, ShiftVolume,
};
