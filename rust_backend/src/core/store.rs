//! Immutable in-memory record store and the persistence collaborator seam.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::{debug, info};
use tokio::runtime::Runtime;

use crate::core::record::TransactionRecord;
use crate::error::{AnalyticsError, AnalyticsResult};

/// Ordered, read-only collection of validated transaction records.
///
/// Cloning is cheap: clones share the same underlying slice. Nothing in the
/// crate mutates a record once it is in a store.
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Arc<[TransactionRecord]>,
}

impl RecordStore {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Loads every record a source yields, preserving its order.
    pub async fn load<S: TransactionSource + ?Sized>(source: &S) -> AnalyticsResult<Self> {
        let records = source.fetch_transactions().await?;
        info!("Loaded {} transaction records", records.len());
        Ok(Self::new(records))
    }

    /// Blocking variant of [`RecordStore::load`] for synchronous callers.
    ///
    /// Builds its own runtime, so it must not be called from async code.
    pub fn load_blocking<S: TransactionSource + ?Sized>(source: &S) -> AnalyticsResult<Self> {
        let runtime = Runtime::new().map_err(|e| {
            AnalyticsError::Source(format!("Failed to create async runtime: {}", e))
        })?;
        runtime.block_on(Self::load(source))
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransactionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns a new store holding the records matching `predicate`.
    pub fn filter<P>(&self, predicate: P) -> RecordStore
    where
        P: Fn(&TransactionRecord) -> bool,
    {
        let kept: Vec<TransactionRecord> =
            self.records.iter().filter(|r| predicate(r)).cloned().collect();
        debug!("Filter kept {} of {} records", kept.len(), self.records.len());
        RecordStore::new(kept)
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        RecordStore::new(Vec::new())
    }
}

impl From<Vec<TransactionRecord>> for RecordStore {
    fn from(records: Vec<TransactionRecord>) -> Self {
        RecordStore::new(records)
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a TransactionRecord;
    type IntoIter = std::slice::Iter<'a, TransactionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Anything that can hand over the canonical record set (a relational
/// table, a cache, a fixture).
///
/// Implementations own all I/O; the analytics core only consumes the
/// returned sequence.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch_transactions(&self) -> AnalyticsResult<Vec<TransactionRecord>>;
}

/// In-memory source for tests and local development.
#[derive(Clone, Default)]
pub struct InMemorySource {
    data: Arc<RwLock<InMemoryData>>,
}

#[derive(Default)]
struct InMemoryData {
    records: Vec<TransactionRecord>,
    unavailable: bool,
}

impl InMemorySource {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self {
            data: Arc::new(RwLock::new(InMemoryData {
                records,
                unavailable: false,
            })),
        }
    }

    pub fn push(&self, record: TransactionRecord) {
        if let Ok(mut data) = self.data.write() {
            data.records.push(record);
        }
    }

    /// Simulates an unreachable backing store.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut data) = self.data.write() {
            data.unavailable = unavailable;
        }
    }
}

#[async_trait]
impl TransactionSource for InMemorySource {
    async fn fetch_transactions(&self) -> AnalyticsResult<Vec<TransactionRecord>> {
        let data = self
            .data
            .read()
            .map_err(|e| AnalyticsError::Source(format!("Lock poisoned: {}", e)))?;
        if data.unavailable {
            return Err(AnalyticsError::Source(
                "in-memory source marked unavailable".to_string(),
            ));
        }
        Ok(data.records.clone())
    }
}
