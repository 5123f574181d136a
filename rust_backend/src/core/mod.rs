//! Core data model: transaction records, the record store, and the
//! dimensions and fields analytics operations are expressed over.

pub mod fields;
pub mod record;
pub mod store;

pub use fields::{Dimension, Field, GroupKey};
pub use record::TransactionRecord;
pub use store::{InMemorySource, RecordStore, TransactionSource};
