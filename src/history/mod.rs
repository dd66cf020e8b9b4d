pub mod logger;

pub use logger::{CsvHistory, RunSummary};

use crate::error::{Result, SimError};
use crate::market::{MarketSnapshot, TransactionRecord};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl RunId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the market sends its history at the end of every iteration.
///
/// Records handed over between two `flush` calls belong to the iteration that
/// just closed. A sink must have stored them durably by the time `flush`
/// returns `Ok`; the market clears its own buffers right after.
pub trait HistorySink: Send + fmt::Debug {
    /// Opens a new run and hands back its identifier.
    fn begin_run(&mut self) -> Result<RunId>;
    fn record_transaction(&mut self, record: &TransactionRecord) -> Result<()>;
    fn record_snapshot(&mut self, record: &MarketSnapshot) -> Result<()>;
    fn flush(&mut self, run: RunId) -> Result<()>;
}

/// In-memory sink. Clones share the same storage, so a test can keep one
/// handle and give the other to the market.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    runs: u64,
    staged_transactions: Vec<TransactionRecord>,
    staged_snapshots: Vec<MarketSnapshot>,
    transactions: Vec<TransactionRecord>,
    snapshots: Vec<MarketSnapshot>,
    flushes: u64,
    fail_writes: bool,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail, for exercising error paths.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.write().fail_writes = fail;
    }

    pub fn runs_started(&self) -> u64 {
        self.inner.read().runs
    }

    pub fn flush_count(&self) -> u64 {
        self.inner.read().flushes
    }

    /// Flushed transactions only; staged ones are invisible until `flush`.
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.inner.read().transactions.clone()
    }

    pub fn snapshots(&self) -> Vec<MarketSnapshot> {
        self.inner.read().snapshots.clone()
    }

    fn check(inner: &MemoryInner) -> Result<()> {
        if inner.fail_writes {
            Err(SimError::Persistence("memory history is set to fail".into()))
        } else {
            Ok(())
        }
    }
}

impl HistorySink for MemoryHistory {
    fn begin_run(&mut self) -> Result<RunId> {
        let mut inner = self.inner.write();
        Self::check(&inner)?;
        inner.runs += 1;
        Ok(RunId::new(inner.runs))
    }

    fn record_transaction(&mut self, record: &TransactionRecord) -> Result<()> {
        let mut inner = self.inner.write();
        Self::check(&inner)?;
        inner.staged_transactions.push(record.clone());
        Ok(())
    }

    fn record_snapshot(&mut self, record: &MarketSnapshot) -> Result<()> {
        let mut inner = self.inner.write();
        Self::check(&inner)?;
        inner.staged_snapshots.push(record.clone());
        Ok(())
    }

    fn flush(&mut self, _run: RunId) -> Result<()> {
        let mut inner = self.inner.write();
        Self::check(&inner)?;

        let inner = &mut *inner;
        inner.transactions.append(&mut inner.staged_transactions);
        inner.snapshots.append(&mut inner.staged_snapshots);
        inner.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::Action;

    #[test]
    fn test_records_visible_after_flush() {
        let history = MemoryHistory::new();
        let mut sink = history.clone();
        let run = sink.begin_run().unwrap();

        sink.record_transaction(&TransactionRecord {
            run_id: run,
            iteration: 0,
            agent_name: "Random_1".into(),
            action: Action::Buy,
            price: 100.5,
        })
        .unwrap();
        assert!(history.transactions().is_empty());

        sink.flush(run).unwrap();
        assert_eq!(history.transactions().len(), 1);
        assert_eq!(history.flush_count(), 1);
    }

    #[test]
    fn test_run_ids_are_sequential() {
        let mut history = MemoryHistory::new();
        assert_eq!(history.begin_run().unwrap(), RunId::new(1));
        assert_eq!(history.begin_run().unwrap(), RunId::new(2));
    }
}
