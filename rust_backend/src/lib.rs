//! Retail sales analytics.
//!
//! Turns an in-memory sequence of validated transaction records into
//! grouped, ranked and period-compared result sets. Reading raw files,
//! storage and rendering are left to collaborators: records arrive through
//! a [`core::TransactionSource`] and results leave as serializable values.
//!
//! # Layout
//!
//! - [`core`]: transaction records, the record store, dimensions and fields
//! - [`temporal`]: weekday and shift derivation from raw date/time text
//! - [`algorithms`]: aggregation, competition ranking, trend comparison
//! - [`services`]: the fixed business questions
//! - [`config`]: TOML configuration
//! - [`error`]: error type shared by every operation

pub mod algorithms;
pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod temporal;

pub use error::{AnalyticsError, AnalyticsResult};
