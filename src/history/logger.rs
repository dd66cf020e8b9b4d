// CSV-backed history. Three append-only files under one directory:
// runs.csv, transactions.csv and market_history.csv. Every row carries its run id.

use super::{HistorySink, RunId};
use crate::error::Result;
use crate::market::{MarketSnapshot, TransactionRecord};
use crate::strategies::Action;
use chrono::{DateTime, Utc};
use csv::{Reader, Writer, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const RUNS_FILE: &str = "runs.csv";
const TRANSACTIONS_FILE: &str = "transactions.csv";
const MARKET_FILE: &str = "market_history.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RunRow {
    run_id: RunId,
    created_at: DateTime<Utc>,
}

pub struct CsvHistory {
    dir: PathBuf,
    transactions: Writer<File>,
    snapshots: Writer<File>,
}

impl fmt::Debug for CsvHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvHistory").field("dir", &self.dir).finish()
    }
}

impl CsvHistory {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let transactions = append_writer(&dir.join(TRANSACTIONS_FILE))?;
        let snapshots = append_writer(&dir.join(MARKET_FILE))?;

        Ok(Self {
            dir,
            transactions,
            snapshots,
        })
    }
}

impl HistorySink for CsvHistory {
    fn begin_run(&mut self) -> Result<RunId> {
        let runs_path = self.dir.join(RUNS_FILE);
        let next = list_runs(&self.dir)?
            .last()
            .map(|id| id.get() + 1)
            .unwrap_or(1);
        let run_id = RunId::new(next);

        let mut writer = append_writer(&runs_path)?;
        writer.serialize(RunRow {
            run_id,
            created_at: Utc::now(),
        })?;
        writer.flush()?;

        info!("Recording run {} under {}", run_id, self.dir.display());
        Ok(run_id)
    }

    fn record_transaction(&mut self, record: &TransactionRecord) -> Result<()> {
        self.transactions.serialize(record)?;
        Ok(())
    }

    fn record_snapshot(&mut self, record: &MarketSnapshot) -> Result<()> {
        self.snapshots.serialize(record)?;
        Ok(())
    }

    fn flush(&mut self, run: RunId) -> Result<()> {
        self.snapshots.flush()?;
        self.transactions.flush()?;
        debug!("History for run {} flushed to disk", run);
        Ok(())
    }
}

// Writes the header row only when the file starts out empty.
fn append_writer(path: &Path) -> Result<Writer<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let is_empty = file.metadata()?.len() == 0;
    Ok(WriterBuilder::new().has_headers(is_empty).from_writer(file))
}

fn read_rows<T>(path: &Path) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// All run ids recorded under `dir`, ascending.
pub fn list_runs(dir: impl AsRef<Path>) -> Result<Vec<RunId>> {
    let rows: Vec<RunRow> = read_rows(&dir.as_ref().join(RUNS_FILE))?;
    let ids: BTreeSet<RunId> = rows.into_iter().map(|row| row.run_id).collect();
    Ok(ids.into_iter().collect())
}

pub fn load_run(
    dir: impl AsRef<Path>,
    run: RunId,
) -> Result<(Vec<TransactionRecord>, Vec<MarketSnapshot>)> {
    let dir = dir.as_ref();
    let transactions: Vec<TransactionRecord> = read_rows(&dir.join(TRANSACTIONS_FILE))?;
    let snapshots: Vec<MarketSnapshot> = read_rows(&dir.join(MARKET_FILE))?;

    Ok((
        transactions.into_iter().filter(|t| t.run_id == run).collect(),
        snapshots.into_iter().filter(|s| s.run_id == run).collect(),
    ))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub trades: usize,
    pub buys: usize,
    pub sells: usize,
    /// Iterations in which at least one trade went through.
    pub active_iterations: usize,
    pub first_price: Option<f64>,
    pub last_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub final_stock: Option<u64>,
}

impl RunSummary {
    pub fn from_records(
        run_id: RunId,
        transactions: &[TransactionRecord],
        snapshots: &[MarketSnapshot],
    ) -> Self {
        let buys = transactions.iter().filter(|t| t.action == Action::Buy).count();
        let sells = transactions.iter().filter(|t| t.action == Action::Sell).count();
        let active: BTreeSet<u64> = transactions.iter().map(|t| t.iteration).collect();

        let prices = snapshots.iter().map(|s| s.price);
        Self {
            run_id,
            trades: transactions.len(),
            buys,
            sells,
            active_iterations: active.len(),
            first_price: snapshots.first().map(|s| s.price),
            last_price: snapshots.last().map(|s| s.price),
            min_price: prices.clone().reduce(f64::min),
            max_price: prices.reduce(f64::max),
            final_stock: snapshots.last().map(|s| s.stock),
        }
    }
}
